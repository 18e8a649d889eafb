//! HTTP client for platform API communication.

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, COOKIE, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::credentials::CredentialBundle;
use crate::error::CliError;
use crate::platform::Platform;
use crate::request::{Body, RequestSpec};

const LINKEDIN_SESSION_COOKIE: &str = "li_at";
const LINKEDIN_CSRF_COOKIE: &str = "JSESSIONID";
const REDDIT_SESSION_COOKIE: &str = "reddit_session";
const REDDIT_TOKEN_COOKIE: &str = "token_v2";

/// Outcome body of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// 204, nothing to parse.
    NoContent,
    /// 2xx with an empty body.
    Empty,
    Json(Value),
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub payload: Payload,
}

impl Response {
    /// Parsed body, with both empty outcomes mapped to `null`.
    pub fn into_json(self) -> Value {
        match self.payload {
            Payload::Json(value) => value,
            Payload::NoContent | Payload::Empty => Value::Null,
        }
    }
}

/// API client bound to one platform and one credential bundle.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    platform: Platform,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the platform the credentials belong to.
    pub fn new(credentials: &CredentialBundle) -> Result<Self, CliError> {
        Self::with_base_url(credentials, credentials.platform().base_url())
    }

    /// Create a client that joins relative paths to `base_url`.
    pub fn with_base_url(
        credentials: &CredentialBundle,
        base_url: impl Into<String>,
    ) -> Result<Self, CliError> {
        let client = reqwest::Client::builder()
            .default_headers(build_headers(credentials)?)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            platform: credentials.platform(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Build a URL for an endpoint. Absolute URLs pass through untouched.
    pub fn url(&self, target: &str) -> String {
        if target.starts_with("https://") || target.starts_with("http://") {
            target.to_string()
        } else {
            format!("{}{}", self.base_url, target)
        }
    }

    /// Issue one request and classify the outcome.
    pub async fn execute(&self, spec: RequestSpec) -> Result<Response, CliError> {
        let url = self.url(&spec.target);
        debug!(platform = %self.platform, method = %spec.method, url = %url, "Sending request");

        let mut request = self.client.request(spec.method, &url);
        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }
        request = match spec.body {
            Body::Empty => request,
            Body::Json(body) => request.json(&body),
            Body::Form(pairs) => request.form(&pairs),
        };
        for (name, value) in spec.headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Handle a successful or error response.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Response, CliError> {
        let status = response.status();
        debug!(platform = %self.platform, status = %status, "Received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CliError::api(self.platform, status.as_u16(), body));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Response {
                status: status.as_u16(),
                payload: Payload::NoContent,
            });
        }

        let text = response.text().await?;
        let payload = if text.trim().is_empty() {
            Payload::Empty
        } else {
            let value = serde_json::from_str(&text).map_err(|e| {
                CliError::malformed(self.platform, "JSON document", format!("{e}"))
            })?;
            Payload::Json(value)
        };

        Ok(Response {
            status: status.as_u16(),
            payload,
        })
    }
}

/// Headers every request to the bundle's platform carries.
pub fn build_headers(credentials: &CredentialBundle) -> Result<HeaderMap, CliError> {
    let platform = credentials.platform();
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(platform.user_agent()));
    headers.insert(ACCEPT, HeaderValue::from_static(platform.accept()));

    match credentials {
        CredentialBundle::Token { token } => {
            headers.insert(AUTHORIZATION, header_value(token)?);
        }
        CredentialBundle::CookiePair { primary, secondary } => {
            let cookies = cookie_header(&[
                (LINKEDIN_SESSION_COOKIE, Some(primary.as_str())),
                (LINKEDIN_CSRF_COOKIE, secondary.as_deref()),
            ]);
            headers.insert(COOKIE, header_value(&cookies)?);

            let csrf = secondary.as_deref().unwrap_or_default().replace('"', "");
            headers.insert(HeaderName::from_static("csrf-token"), header_value(&csrf)?);
            headers.insert(
                HeaderName::from_static("x-li-lang"),
                HeaderValue::from_static("en_US"),
            );
            headers.insert(
                HeaderName::from_static("x-restli-protocol-version"),
                HeaderValue::from_static("2.0.0"),
            );
        }
        CredentialBundle::OAuthOrCookie {
            access_token: Some(token),
            ..
        } => {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        }
        CredentialBundle::OAuthOrCookie {
            access_token: None,
            session_cookie,
            secondary_cookie,
        } => {
            let cookies = cookie_header(&[
                (REDDIT_SESSION_COOKIE, session_cookie.as_deref()),
                (REDDIT_TOKEN_COOKIE, secondary_cookie.as_deref()),
            ]);
            headers.insert(COOKIE, header_value(&cookies)?);
        }
    }

    Ok(headers)
}

/// `name=value` pairs joined by `; `, skipping absent cookies.
fn cookie_header(cookies: &[(&str, Option<&str>)]) -> String {
    cookies
        .iter()
        .filter_map(|(name, value)| value.map(|value| format!("{name}={value}")))
        .collect::<Vec<_>>()
        .join("; ")
}

fn header_value(value: &str) -> Result<HeaderValue, CliError> {
    let value = HeaderValue::from_str(value).context("Invalid credential format")?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers.get(name).and_then(|value| value.to_str().ok())
    }

    #[test]
    fn discord_token_has_no_bearer_prefix() {
        let headers = build_headers(&CredentialBundle::Token {
            token: "abc123".to_string(),
        })
        .unwrap();

        assert_eq!(header(&headers, "authorization"), Some("abc123"));
        assert_eq!(header(&headers, "accept"), Some("application/json"));
        assert!(header(&headers, "user-agent").unwrap().starts_with("Mozilla/5.0"));
        assert!(headers.get("cookie").is_none());
    }

    #[test]
    fn linkedin_csrf_token_strips_quotes() {
        let headers = build_headers(&CredentialBundle::CookiePair {
            primary: "li".to_string(),
            secondary: Some("\"ajax:123\"".to_string()),
        })
        .unwrap();

        assert_eq!(
            header(&headers, "cookie"),
            Some("li_at=li; JSESSIONID=\"ajax:123\"")
        );
        assert_eq!(header(&headers, "csrf-token"), Some("ajax:123"));
        assert_eq!(header(&headers, "x-restli-protocol-version"), Some("2.0.0"));
        assert_eq!(
            header(&headers, "accept"),
            Some("application/vnd.linkedin.normalized+json+2.1")
        );
        assert!(headers.get("authorization").is_none());
    }

    #[test]
    fn linkedin_without_jsessionid_sends_empty_csrf() {
        let headers = build_headers(&CredentialBundle::CookiePair {
            primary: "li".to_string(),
            secondary: None,
        })
        .unwrap();

        assert_eq!(header(&headers, "cookie"), Some("li_at=li"));
        assert_eq!(header(&headers, "csrf-token"), Some(""));
    }

    #[test]
    fn reddit_access_token_skips_cookies() {
        let headers = build_headers(&CredentialBundle::OAuthOrCookie {
            access_token: Some("tok".to_string()),
            session_cookie: Some("sess".to_string()),
            secondary_cookie: None,
        })
        .unwrap();

        assert_eq!(header(&headers, "authorization"), Some("Bearer tok"));
        assert!(headers.get("cookie").is_none());
    }

    #[test]
    fn reddit_falls_back_to_cookies() {
        let headers = build_headers(&CredentialBundle::OAuthOrCookie {
            access_token: None,
            session_cookie: Some("sess".to_string()),
            secondary_cookie: Some("v2".to_string()),
        })
        .unwrap();

        assert_eq!(
            header(&headers, "cookie"),
            Some("reddit_session=sess; token_v2=v2")
        );
        assert!(headers.get("authorization").is_none());
    }

    #[test]
    fn control_characters_in_credentials_are_rejected() {
        let result = build_headers(&CredentialBundle::Token {
            token: "bad\ntoken".to_string(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_url_building() {
        let creds = CredentialBundle::Token {
            token: "t".to_string(),
        };
        let client = ApiClient::new(&creds).unwrap();
        assert_eq!(
            client.url("/users/@me"),
            "https://discord.com/api/v10/users/@me"
        );
        assert_eq!(
            client.url("https://cdn.example.com/next?page=2"),
            "https://cdn.example.com/next?page=2"
        );
    }
}

//! Credential resolution.
//!
//! Each credential field is looked up in the config source first and the
//! environment second. Fields resolve independently, so a config file that
//! only carries `li_at` still picks `JSESSIONID` up from the environment.

use std::fmt;

use regex::Regex;

use crate::config::{ConfigSource, Env};
use crate::error::CliError;
use crate::platform::Platform;

/// Where one credential field can come from.
#[derive(Debug, Clone, Copy)]
struct FieldSource {
    /// Pattern with one capture group holding the value.
    pattern: &'static str,
    env: &'static str,
}

const DISCORD_TOKEN: FieldSource = FieldSource {
    pattern: r"(?s)### Discord \(User\).*?token:\s*`([^`]+)`",
    env: "DISCORD_USER_TOKEN",
};

const LINKEDIN_LI_AT: FieldSource = FieldSource {
    pattern: r"li_at:\s*`([^`]+)`",
    env: "LINKEDIN_LI_AT",
};

const LINKEDIN_JSESSIONID: FieldSource = FieldSource {
    pattern: r"JSESSIONID:\s*`([^`]+)`",
    env: "LINKEDIN_JSESSIONID",
};

const REDDIT_SESSION: FieldSource = FieldSource {
    pattern: r"reddit_session:\s*`([^`]+)`",
    env: "REDDIT_SESSION",
};

const REDDIT_TOKEN_V2: FieldSource = FieldSource {
    pattern: r"token_v2:\s*`([^`]+)`",
    env: "REDDIT_TOKEN_V2",
};

const REDDIT_ACCESS_TOKEN: FieldSource = FieldSource {
    pattern: r"access_token:\s*`([^`]+)`",
    env: "REDDIT_ACCESS_TOKEN",
};

/// Authentication material for one platform.
///
/// Built once per process and never written anywhere.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialBundle {
    /// Raw user token sent as-is in `Authorization` (Discord).
    Token { token: String },

    /// `li_at` session cookie plus the `JSESSIONID` cookie that seeds the
    /// CSRF header (LinkedIn).
    CookiePair {
        primary: String,
        secondary: Option<String>,
    },

    /// OAuth access token when available, otherwise the session cookies
    /// (Reddit).
    OAuthOrCookie {
        access_token: Option<String>,
        session_cookie: Option<String>,
        secondary_cookie: Option<String>,
    },
}

impl CredentialBundle {
    /// Platform this bundle authenticates against.
    pub fn platform(&self) -> Platform {
        match self {
            Self::Token { .. } => Platform::Discord,
            Self::CookiePair { .. } => Platform::LinkedIn,
            Self::OAuthOrCookie { .. } => Platform::Reddit,
        }
    }
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "<redacted>"
            } else {
                "<none>"
            }
        }

        match self {
            Self::Token { .. } => f
                .debug_struct("Token")
                .field("token", &"<redacted>")
                .finish(),
            Self::CookiePair { secondary, .. } => f
                .debug_struct("CookiePair")
                .field("primary", &"<redacted>")
                .field("secondary", &mask(secondary))
                .finish(),
            Self::OAuthOrCookie {
                access_token,
                session_cookie,
                secondary_cookie,
            } => f
                .debug_struct("OAuthOrCookie")
                .field("access_token", &mask(access_token))
                .field("session_cookie", &mask(session_cookie))
                .field("secondary_cookie", &mask(secondary_cookie))
                .finish(),
        }
    }
}

/// Resolve the credential bundle for `platform`.
///
/// Returns [`CliError::MissingCredentials`] when neither source supplies the
/// platform's minimum fields. Absent optional fields are not an error.
pub fn resolve(
    platform: Platform,
    config: &ConfigSource,
    env: &dyn Env,
) -> Result<CredentialBundle, CliError> {
    let field = |source: FieldSource| lookup(source, config, env);

    let bundle = match platform {
        Platform::Discord => field(DISCORD_TOKEN).map(|token| CredentialBundle::Token { token }),
        Platform::LinkedIn => field(LINKEDIN_LI_AT).map(|primary| CredentialBundle::CookiePair {
            primary,
            secondary: field(LINKEDIN_JSESSIONID),
        }),
        Platform::Reddit => {
            let access_token = field(REDDIT_ACCESS_TOKEN);
            let session_cookie = field(REDDIT_SESSION);
            if access_token.is_none() && session_cookie.is_none() {
                None
            } else {
                Some(CredentialBundle::OAuthOrCookie {
                    access_token,
                    session_cookie,
                    secondary_cookie: field(REDDIT_TOKEN_V2),
                })
            }
        }
    };

    let bundle = bundle.ok_or(CliError::MissingCredentials { platform })?;
    tracing::debug!(%platform, credentials = ?bundle, "Resolved credentials");
    Ok(bundle)
}

/// Config value first, environment second. Blank values count as absent.
fn lookup(source: FieldSource, config: &ConfigSource, env: &dyn Env) -> Option<String> {
    let present = |value: &String| !value.trim().is_empty();
    config
        .text()
        .and_then(|text| extract(source.pattern, text))
        .filter(present)
        .or_else(|| env.var(source.env).filter(present))
}

fn extract(pattern: &str, text: &str) -> Option<String> {
    let regex = Regex::new(pattern).ok()?;
    regex
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_string())
}

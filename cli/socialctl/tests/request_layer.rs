use serde_json::{json, Value};
use socialctl::client::{ApiClient, Payload};
use socialctl::credentials::CredentialBundle;
use socialctl::error::CliError;
use socialctl::platform::Platform;
use socialctl::request::RequestSpec;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn get_json(client: &ApiClient, target: &str) -> Result<Value, CliError> {
    client
        .execute(RequestSpec::get(target))
        .await
        .map(|response| response.into_json())
}

fn discord(token: &str) -> CredentialBundle {
    CredentialBundle::Token {
        token: token.to_string(),
    }
}

#[tokio::test]
async fn discord_token_is_sent_raw() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .and(header("authorization", "abc123"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(&discord("abc123"), server.uri()).unwrap();
    let body = get_json(&client, "/users/@me").await.unwrap();
    assert_eq!(body, json!({ "id": "1" }));
}

#[tokio::test]
async fn linkedin_sends_cookie_pair_and_csrf() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("cookie", "li_at=AQ1; JSESSIONID=\"ajax:42\""))
        .and(header("csrf-token", "ajax:42"))
        .and(header("x-restli-protocol-version", "2.0.0"))
        .and(header("accept", "application/vnd.linkedin.normalized+json+2.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = CredentialBundle::CookiePair {
        primary: "AQ1".to_string(),
        secondary: Some("\"ajax:42\"".to_string()),
    };
    let client = ApiClient::with_base_url(&credentials, server.uri()).unwrap();
    get_json(&client, "/me").await.unwrap();
}

#[tokio::test]
async fn reddit_prefers_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/me"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "me" })))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = CredentialBundle::OAuthOrCookie {
        access_token: Some("tok".to_string()),
        session_cookie: Some("sess".to_string()),
        secondary_cookie: None,
    };
    let client = ApiClient::with_base_url(&credentials, server.uri()).unwrap();
    get_json(&client, "/api/v1/me").await.unwrap();
}

#[tokio::test]
async fn no_content_is_its_own_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(&discord("t"), server.uri()).unwrap();
    let response = client
        .execute(RequestSpec::put("/channels/1/messages/2/reactions/%F0%9F%91%8D/@me"))
        .await
        .unwrap();
    assert_eq!(response.status, 204);
    assert_eq!(response.payload, Payload::NoContent);
}

#[tokio::test]
async fn empty_success_body_is_empty_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(&discord("t"), server.uri()).unwrap();
    let response = client.execute(RequestSpec::post("/invites/abc")).await.unwrap();
    assert_eq!(response.payload, Payload::Empty);
}

#[tokio::test]
async fn error_status_carries_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(&discord("t"), server.uri()).unwrap();
    let err = get_json(&client, "/users/9").await.unwrap_err();
    match err {
        CliError::Api {
            platform,
            status,
            body,
        } => {
            assert_eq!(platform, Platform::Discord);
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_success_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(&discord("t"), server.uri()).unwrap();
    let err = get_json(&client, "/users/@me").await.unwrap_err();
    assert!(matches!(err, CliError::MalformedResponse { .. }));
}

#[tokio::test]
async fn absolute_targets_bypass_the_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(&discord("t"), "https://discord.invalid/api/v10").unwrap();
    let body = get_json(&client, &format!("{}/elsewhere", server.uri())).await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn query_and_form_are_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/vote"))
        .and(query_param("raw_json", "1"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("id=t3_abc&dir=1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = CredentialBundle::OAuthOrCookie {
        access_token: Some("tok".to_string()),
        session_cookie: None,
        secondary_cookie: None,
    };
    let client = ApiClient::with_base_url(&credentials, server.uri()).unwrap();
    client
        .execute(
            RequestSpec::post("/api/vote")
                .query("raw_json", 1)
                .form([("id", "t3_abc"), ("dir", "1")]),
        )
        .await
        .unwrap();
}

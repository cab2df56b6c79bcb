//! Trello REST client tests using wiremock
//!
//! Verifies that every request carries `key` and `token` as query
//! parameters, that non-success responses surface as `TrelloAuthError::Api`,
//! and that nothing is sent without a complete credential.

use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trello_mcp_auth::api::TrelloClient;
use trello_mcp_auth::auth::credentials::Credential;
use trello_mcp_auth::config::ApiConfig;
use trello_mcp_auth::TrelloAuthError;

fn client_for(server: &MockServer, credential: Credential) -> TrelloClient<Credential> {
    let config = ApiConfig {
        base_url: format!("{}/1", server.uri()),
        timeout_seconds: 5,
    };
    TrelloClient::new(&config, Arc::new(credential)).expect("client builds")
}

#[tokio::test]
async fn test_current_member_sends_key_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/members/me"))
        .and(query_param("key", "ABCD1234"))
        .and(query_param("token", "XYZ999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "5f0c",
            "username": "jdoe",
            "fullName": "Jane Doe"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let member = client_for(&server, Credential::new("ABCD1234", "XYZ999"))
        .current_member()
        .await
        .expect("member");

    assert_eq!(member.username, "jdoe");
    assert_eq!(member.full_name.as_deref(), Some("Jane Doe"));
}

#[tokio::test]
async fn test_request_merges_extra_params_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/cards"))
        .and(query_param("key", "k"))
        .and(query_param("token", "t"))
        .and(query_param("idList", "list1"))
        .and(body_json(json!({"name": "Card"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "card1"})))
        .expect(1)
        .mount(&server)
        .await;

    let value = client_for(&server, Credential::new("k", "t"))
        .request(
            Method::POST,
            "/cards",
            &[("idList", "list1")],
            Some(&json!({"name": "Card"})),
        )
        .await
        .expect("created");

    assert_eq!(value["id"], "card1");
}

#[tokio::test]
async fn test_unauthorized_response_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/members/me"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let err = client_for(&server, Credential::new("k", "revoked"))
        .current_member()
        .await
        .unwrap_err();

    match err {
        TrelloAuthError::Api { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid token");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_token_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server, Credential::new("k", ""))
        .current_member()
        .await
        .unwrap_err();

    assert!(matches!(err, TrelloAuthError::NotAuthenticated(_)));
}

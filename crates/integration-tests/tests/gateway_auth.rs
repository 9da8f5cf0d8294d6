//! Auth API wire format and bearer switching.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use boutique_core::Email;
use boutique_gateway::{AuthProvider, GatewayError, ProductStore};
use boutique_integration_tests::{ANON_KEY, TestBackend, token_response};

const USER_ID: &str = "0b0f6c5e-3f6b-4c8e-9f51-6d1f7b2a9c11";

fn credentials() -> (Email, SecretString) {
    (
        Email::parse("admin@techgadget.cm").unwrap(),
        SecretString::from("s3cret-pass".to_string()),
    )
}

#[tokio::test]
async fn test_password_grant_then_bearer_is_access_token() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", ANON_KEY))
        .and(body_json(json!({
            "email": "admin@techgadget.cm",
            "password": "s3cret-pass"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_response(USER_ID, "admin@techgadget.cm")),
        )
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(header("Authorization", "Bearer user-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&backend.server)
        .await;

    let (email, password) = credentials();
    let session = backend.client.sign_in(&email, &password).await.unwrap();

    assert_eq!(session.user_id().to_string(), USER_ID);
    assert!(session.expires_at.is_some());
    assert_eq!(backend.client.current_session(), Some(session));
    assert!(backend.client.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_password_is_invalid_credentials() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "error_code": "invalid_credentials",
            "msg": "Invalid login credentials"
        })))
        .mount(&backend.server)
        .await;

    let (email, password) = credentials();
    let err = backend.client.sign_in(&email, &password).await.unwrap_err();

    assert!(matches!(err, GatewayError::InvalidCredentials));
    assert!(backend.client.current_session().is_none());
}

#[tokio::test]
async fn test_sign_out_sends_user_token_and_falls_back_to_anon() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_response(USER_ID, "admin@techgadget.cm")),
        )
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("Authorization", "Bearer user-access-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(header("Authorization", format!("Bearer {ANON_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&backend.server)
        .await;

    let (email, password) = credentials();
    backend.client.sign_in(&email, &password).await.unwrap();
    AuthProvider::sign_out(&backend.client).await.unwrap();

    assert!(backend.client.current_session().is_none());
    backend.client.list_products().await.unwrap();
}

#[tokio::test]
async fn test_refresh_uses_refresh_token_grant() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_response(USER_ID, "admin@techgadget.cm")),
        )
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({ "refresh_token": "user-refresh-token" })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid Refresh Token: Already Used"
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let (email, password) = credentials();
    backend.client.sign_in(&email, &password).await.unwrap();
    let err = backend.client.refresh().await.unwrap_err();

    assert!(matches!(err, GatewayError::Unauthorized(_)));
    assert!(backend.client.current_session().is_none());
}

//! Cart, checkout and admin session flows over the mock backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use boutique_admin::AdminAuthService;
use boutique_core::ActorId;
use boutique_gateway::{AuthProvider, GatewayConfig, SupabaseClient};
use boutique_integration_tests::{
    ANON_KEY, FALLBACK_WHATSAPP, TestApp, cart_row, settings_row, token_response,
};
use boutique_storefront::checkout::contact_url;
use boutique_storefront::identity::SESSION_KEY;
use boutique_storefront::local_storage::FileStorage;
use boutique_storefront::notify::{ChannelNotifier, Notice};
use boutique_storefront::{AppState, ShopError};

const PRODUCT_ID: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";
const USER_ID: &str = "0b0f6c5e-3f6b-4c8e-9f51-6d1f7b2a9c11";

#[tokio::test]
async fn test_anonymous_add_then_checkout() {
    let mut app = TestApp::start().await;
    let visitor = match app.state.identity().current_actor().unwrap() {
        ActorId::Anonymous(id) => id,
        other => panic!("expected an anonymous actor, got {other:?}"),
    };
    let actor_filter = format!("eq.{visitor}");
    let server = &app.backend.server;

    // Empty before the insert, one line until checkout clears it.
    Mock::given(method("GET"))
        .and(path("/rest/v1/cart_items"))
        .and(query_param("user_id", actor_filter.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cart_items"))
        .and(query_param("user_id", actor_filter.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([cart_row(PRODUCT_ID, 1, "Casque", 15000)])),
        )
        .up_to_n_times(2)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cart_items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/cart_items"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(settings_row("+237690000000")))
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/cart_items"))
        .and(query_param("user_id", actor_filter.as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(server)
        .await;

    app.state
        .cart()
        .add_to_cart(PRODUCT_ID.parse().unwrap())
        .await
        .unwrap();
    assert_eq!(app.state.cart().item_count(), 1);

    let link = app.state.checkout().await.unwrap();

    assert!(link.message.contains("Casque (x1)"), "{}", link.message);
    assert!(link.url.starts_with("https://wa.me/+237690000000?text="));
    assert!(app.state.cart().lines().is_empty());
    assert_eq!(app.drain_notices(), vec![Notice::ItemAdded]);
}

#[tokio::test]
async fn test_checkout_of_empty_cart_uses_no_backend_writes() {
    let mut app = TestApp::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cart_items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/settings"))
        .respond_with(ResponseTemplate::new(406).set_body_json(json!({ "code": "PGRST116" })))
        .mount(&app.backend.server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&app.backend.server)
        .await;

    let err = app.state.checkout().await.unwrap_err();

    assert!(matches!(err, ShopError::EmptyCart));
    assert_eq!(app.drain_notices(), vec![Notice::EmptyCart]);
    assert_eq!(
        app.state.contact_link().await,
        contact_url(FALLBACK_WHATSAPP)
    );
}

#[tokio::test]
async fn test_admin_session_persists_and_scopes_the_cart() {
    let app = TestApp::start().await;
    let server = &app.backend.server;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_response(USER_ID, "admin@techgadget.cm")),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cart_items"))
        .and(query_param("user_id", format!("eq.{USER_ID}").as_str()))
        .and(header("Authorization", "Bearer user-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(server)
        .await;

    let password = SecretString::from("s3cret-pass".to_string());
    AdminAuthService::new(&app.state)
        .sign_in("admin@techgadget.cm", &password)
        .await
        .unwrap();
    app.state.cart().fetch_cart().await.unwrap();

    let file = app.dir.path().join("local_storage.json");
    let stored: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert!(stored.contains_key(SESSION_KEY));

    // A fresh process over the same storage file picks the session back up.
    let config = GatewayConfig::new(&server.uri(), ANON_KEY).unwrap();
    let client = SupabaseClient::new(&config).unwrap();
    let (notifier, _notices) = ChannelNotifier::new();
    let restarted = AppState::new(
        Arc::new(client.clone()),
        Arc::new(FileStorage::new(file)),
        Arc::new(notifier),
        FALLBACK_WHATSAPP,
    );
    let restored = restarted.start().await.unwrap().unwrap();

    assert_eq!(restored.user_id().to_string(), USER_ID);
    assert!(client.current_session().is_some());
    restarted.cart().fetch_cart().await.unwrap();
}

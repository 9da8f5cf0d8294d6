//! Integration tests for Boutique.
//!
//! Every test runs against a `wiremock` server standing in for the hosted
//! backend, so no network access or credentials are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p boutique-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `gateway_tables` - Table requests: paths, filters, headers, error mapping
//! - `gateway_auth` - Password sign-in, sign-out and bearer switching
//! - `gateway_storage` - Image uploads and public URLs
//! - `storefront_flow` - Cart, checkout and admin flows end to end

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::MockServer;

use boutique_gateway::{GatewayConfig, SupabaseClient};
use boutique_storefront::AppState;
use boutique_storefront::local_storage::FileStorage;
use boutique_storefront::notify::{ChannelNotifier, Notice};

/// API key used by every test client.
pub const ANON_KEY: &str = "test-anon-key";

/// Number used when the settings row is missing.
pub const FALLBACK_WHATSAPP: &str = "+237695959595";

/// A mock backend and a client pointed at it.
pub struct TestBackend {
    pub server: MockServer,
    pub client: SupabaseClient,
}

impl TestBackend {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let config = GatewayConfig::new(&server.uri(), ANON_KEY).unwrap();
        let client = SupabaseClient::new(&config).unwrap();
        Self { server, client }
    }
}

/// Application state over a mock backend, with local storage in a temp dir.
pub struct TestApp {
    pub backend: TestBackend,
    pub state: AppState,
    pub notices: tokio::sync::mpsc::UnboundedReceiver<Notice>,
    pub dir: TempDir,
}

impl TestApp {
    pub async fn start() -> Self {
        let backend = TestBackend::start().await;
        let dir = TempDir::new().unwrap();
        let (notifier, notices) = ChannelNotifier::new();
        let state = AppState::new(
            Arc::new(backend.client.clone()),
            Arc::new(FileStorage::new(dir.path().join("local_storage.json"))),
            Arc::new(notifier),
            FALLBACK_WHATSAPP,
        );
        Self {
            backend,
            state,
            notices,
            dir,
        }
    }

    /// Notices sent so far.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            notices.push(notice);
        }
        notices
    }
}

/// A `products` row.
#[must_use]
pub fn product_row(id: &str, name: &str, price: i64) -> Value {
    json!({
        "id": id,
        "created_at": "2025-03-01T10:00:00+00:00",
        "name": name,
        "price": price,
        "description": format!("{name} description"),
        "category_id": null,
        "image_url": null
    })
}

/// A `cart_items` row with its product join.
#[must_use]
pub fn cart_row(product_id: &str, quantity: u32, name: &str, price: i64) -> Value {
    json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "product_id": product_id,
        "quantity": quantity,
        "product": { "name": name, "price": price, "image_url": null }
    })
}

/// A token grant response.
#[must_use]
pub fn token_response(user_id: &str, email: &str) -> Value {
    json!({
        "access_token": "user-access-token",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "user-refresh-token",
        "user": { "id": user_id, "email": email, "aud": "authenticated" }
    })
}

/// The `settings` row.
#[must_use]
pub fn settings_row(whatsapp: &str) -> Value {
    json!({
        "id": 1,
        "shop_name": "TechGadget",
        "contact_email": "contact@techgadget.cm",
        "whatsapp": whatsapp,
        "address": "Akwa, Douala",
        "language": "fr"
    })
}

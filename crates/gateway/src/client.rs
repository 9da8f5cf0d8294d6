//! HTTP client for the hosted backend.
//!
//! One `reqwest::Client` is shared by the table, auth and storage APIs. The
//! current auth session lives here too: when present its access token is sent
//! as the bearer, otherwise the anon key is.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::auth::Session;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, from_rest_response};
use crate::query::TableQuery;

/// Client for the hosted backend.
///
/// Cheap to clone; clones share the HTTP connection pool and the session.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base: Url,
    anon_key: SecretString,
    bucket: String,
    session: RwLock<Option<Session>>,
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Http` if the HTTP client fails to build.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base: config.url.clone(),
                anon_key: config.anon_key.clone(),
                bucket: config.storage_bucket.clone(),
                session: RwLock::new(None),
            }),
        })
    }

    /// Start a request against `table`.
    #[must_use]
    pub fn from(&self, table: &'static str) -> TableQuery<'_> {
        TableQuery::new(self, table)
    }

    /// The current auth session, if signed in.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the current session (e.g. one restored from local storage).
    pub fn set_session(&self, session: Option<Session>) {
        *self
            .inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Storage bucket used for images.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.inner.bucket
    }

    pub(crate) fn base(&self) -> &Url {
        &self.inner.base
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        Ok(self.inner.base.join(path)?)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub(crate) fn anon_key(&self) -> &str {
        self.inner.anon_key.expose_secret()
    }

    /// Bearer token: the session's access token, else the anon key.
    pub(crate) fn bearer(&self) -> String {
        self.session().map_or_else(
            || self.anon_key().to_string(),
            |s| s.access_token.expose_secret().to_string(),
        )
    }

    /// Attach the `apikey` and `Authorization` headers.
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.anon_key())
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }

    /// Send a table/storage request and return the response body on success.
    ///
    /// `context` names the request in errors and logs.
    pub(crate) async fn send(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<String, GatewayError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                context,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(from_rest_response(status.as_u16(), &body, context));
        }

        debug!(status = %status, context, bytes = body.len(), "Backend request succeeded");
        Ok(body)
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base", &self.inner.base.as_str())
            .field("bucket", &self.inner.bucket)
            .field("signed_in", &self.session().is_some())
            .finish_non_exhaustive()
    }
}

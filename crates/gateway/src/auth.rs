//! Password sign-in, token refresh and sign-out against the auth API.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{info, instrument, warn};

use boutique_core::{Email, UserId};

use crate::client::SupabaseClient;
use crate::error::{GatewayError, from_auth_response};

/// The user attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session.
///
/// Serializable so it can be persisted in client-local storage between runs.
/// Implements `Debug` manually to redact tokens.
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(serialize_with = "expose")]
    pub access_token: SecretString,
    #[serde(serialize_with = "expose")]
    pub refresh_token: SecretString,
    /// Unix timestamp (seconds) after which the access token is rejected.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing)]
    expires_in: Option<i64>,
    pub user: AuthUser,
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Session {
    /// Build a session from already-issued tokens.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: Option<i64>,
        user: AuthUser,
    ) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            refresh_token: SecretString::from(refresh_token.into()),
            expires_at,
            expires_in: None,
            user,
        }
    }

    /// The signed-in user's id.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user.id
    }

    /// Whether the access token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now.timestamp() >= at)
    }

    /// Fill `expires_at` from `expires_in` when the server only sent the latter.
    fn with_absolute_expiry(mut self, now: DateTime<Utc>) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = self.expires_in.map(|secs| now.timestamp() + secs);
        }
        self
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.access_token.expose_secret() == other.access_token.expose_secret()
            && self.user == other.user
    }
}

impl SupabaseClient {
    /// Sign in with email and password; the session becomes current.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidCredentials` when the pair is rejected.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Session, GatewayError> {
        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });
        let session = self.token_grant("password", &body).await?;
        info!(user_id = %session.user_id(), "Signed in");
        Ok(session)
    }

    /// Exchange the current refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Unauthorized` if there is no session or the
    /// refresh token is rejected.
    #[instrument(skip(self))]
    pub async fn refresh_session(&self) -> Result<Session, GatewayError> {
        let current = self
            .session()
            .ok_or_else(|| GatewayError::Unauthorized("no session to refresh".to_string()))?;
        let body = serde_json::json!({
            "refresh_token": current.refresh_token.expose_secret(),
        });
        match self.token_grant("refresh_token", &body).await {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!(error = %e, "Session refresh failed, dropping session");
                self.set_session(None);
                Err(match e {
                    GatewayError::InvalidCredentials => {
                        GatewayError::Unauthorized("refresh token rejected".to_string())
                    }
                    other => other,
                })
            }
        }
    }

    /// Sign out. The local session is cleared even if the server call fails.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the server rejects the logout.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), GatewayError> {
        let Some(session) = self.session() else {
            return Ok(());
        };
        self.set_session(None);

        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .http()
            .post(url)
            .header("apikey", self.anon_key())
            .header(
                "Authorization",
                format!("Bearer {}", session.access_token.expose_secret()),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(from_auth_response(status.as_u16(), &body));
        }
        info!(user_id = %session.user_id(), "Signed out");
        Ok(())
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: &serde_json::Value,
    ) -> Result<Session, GatewayError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let response = self
            .http()
            .post(url)
            .header("apikey", self.anon_key())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(from_auth_response(status.as_u16(), &text));
        }

        let session = serde_json::from_str::<Session>(&text)?.with_absolute_expiry(Utc::now());
        self.set_session(Some(session.clone()));
        Ok(session)
    }
}

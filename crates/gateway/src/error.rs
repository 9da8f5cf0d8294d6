//! Gateway error type.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("API error: {status} {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// A single-row request matched zero (or several) rows.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request needs a valid session (missing, expired, or rejected token).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Email/password rejected by the auth service.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Response body did not have the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// One failure handed to every caller of a coalesced request.
    #[error(transparent)]
    Shared(Arc<GatewayError>),
}

impl GatewayError {
    /// Whether retrying the same call later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::Shared(inner) => inner.is_transient(),
            _ => false,
        }
    }

    /// Whether a single-row request matched nothing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Shared(inner) => inner.is_not_found(),
            _ => false,
        }
    }

    /// Take back an error returned through a shared request, unwrapping it
    /// when no other caller still holds it.
    #[must_use]
    pub fn unshare(err: Arc<Self>) -> Self {
        Arc::try_unwrap(err).unwrap_or_else(Self::Shared)
    }
}

/// Error body returned by the table API.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RestErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

/// Error body returned by the auth API (both legacy and current shapes).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AuthErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

/// Code returned when a single-object request does not match exactly one row.
const SINGLE_ROW_CODE: &str = "PGRST116";

/// Map a non-success table response to a `GatewayError`.
pub(crate) fn from_rest_response(status: u16, body: &str, context: &str) -> GatewayError {
    let parsed: RestErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code.unwrap_or_default();

    if status == 406 || code == SINGLE_ROW_CODE {
        return GatewayError::NotFound(context.to_string());
    }
    if status == 401 || code == "PGRST301" {
        return GatewayError::Unauthorized(parsed.message.unwrap_or_else(|| context.to_string()));
    }

    let message = match (parsed.message, parsed.details) {
        (Some(m), Some(d)) => format!("{m} ({d})"),
        (Some(m), None) => m,
        (None, _) => body.chars().take(200).collect(),
    };
    GatewayError::Api {
        status,
        code,
        message,
    }
}

/// Map a non-success auth response to a `GatewayError`.
pub(crate) fn from_auth_response(status: u16, body: &str) -> GatewayError {
    let parsed: AuthErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed
        .error_code
        .or(parsed.error)
        .unwrap_or_default();

    if code == "invalid_grant" || code == "invalid_credentials" {
        return GatewayError::InvalidCredentials;
    }
    if status == 401 || status == 403 {
        return GatewayError::Unauthorized(parsed.msg.unwrap_or(code));
    }
    GatewayError::Api {
        status,
        message: parsed
            .msg
            .or(parsed.error_description)
            .unwrap_or_else(|| body.chars().take(200).collect()),
        code,
    }
}

//! Gateway configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Base URL of the hosted project (e.g. `https://abcd.supabase.co`)
//! - `SUPABASE_ANON_KEY` - Public API key sent with every request
//!
//! ## Optional
//! - `SUPABASE_STORAGE_BUCKET` - Bucket for product images (default: `product-images`)
//! - `SUPABASE_TIMEOUT_SECS` - Per-request timeout (default: 15)

use std::collections::HashMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default bucket holding product and category images.
pub const DEFAULT_STORAGE_BUCKET: &str = "product-images";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Connection settings for the hosted backend.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Project base URL.
    pub url: Url,
    /// Public API key.
    pub anon_key: SecretString,
    /// Storage bucket for images.
    pub storage_bucket: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("storage_bucket", &self.storage_bucket)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GatewayConfig {
    /// Build a configuration directly, e.g. for tests against a mock server.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `url` does not parse.
    pub fn new(url: &str, anon_key: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_base_url("SUPABASE_URL", url)?,
            anon_key: SecretString::from(anon_key.into()),
            storage_bucket: DEFAULT_STORAGE_BUCKET.to_string(),
            timeout: Duration::from_secs(15),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let url = parse_base_url("SUPABASE_URL", &env::required("SUPABASE_URL")?)?;
        let anon_key = env::validated_secret("SUPABASE_ANON_KEY")?;
        let storage_bucket = env::or_default("SUPABASE_STORAGE_BUCKET", DEFAULT_STORAGE_BUCKET);
        let timeout_secs = env::parsed_or_default::<u64>("SUPABASE_TIMEOUT_SECS", 15)?;

        Ok(Self {
            url,
            anon_key,
            storage_bucket,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// The API key as a header value.
    #[must_use]
    pub fn anon_key(&self) -> &str {
        self.anon_key.expose_secret()
    }
}

/// Parse the project URL, normalizing it to end with `/` so joins append.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(&format!("{trimmed}/"))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Environment helpers shared by the crates that load configuration.
pub mod env {
    use std::str::FromStr;

    use secrecy::SecretString;

    use super::{ConfigError, validate_secret_strength};

    /// Get a required environment variable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if unset.
    pub fn required(key: &str) -> Result<String, ConfigError> {
        std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional environment variable; blank counts as unset.
    #[must_use]
    pub fn optional(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// Get an environment variable with a default value.
    #[must_use]
    pub fn or_default(key: &str, default: &str) -> String {
        optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse an environment variable, falling back to `default` when unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the value does not parse.
    pub fn parsed_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Load and validate a secret from environment.
    ///
    /// # Errors
    ///
    /// Returns an error if unset, a placeholder, or low-entropy.
    pub fn validated_secret(key: &str) -> Result<SecretString, ConfigError> {
        let value = required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the project dashboard."
            ),
        ));
    }

    Ok(())
}

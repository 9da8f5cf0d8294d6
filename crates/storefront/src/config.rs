//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Base URL of the hosted backend
//! - `SUPABASE_ANON_KEY` - Public API key (rejected if it looks like a placeholder)
//!
//! ## Optional
//! - `SUPABASE_STORAGE_BUCKET` - Image bucket (default: `product-images`)
//! - `SUPABASE_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `BOUTIQUE_LOCAL_STORAGE` - File backing client-local storage
//!   (default: `.boutique/local_storage.json`)
//! - `BOUTIQUE_FALLBACK_WHATSAPP` - Number used when settings are unavailable
//!   (default: `+237695959595`)
//! - `BOUTIQUE_LOG_FORMAT` - `pretty` or `json` (default: `pretty`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;

use boutique_gateway::config::{ConfigError, GatewayConfig, env};

/// Default location of the client-local storage file.
pub const DEFAULT_LOCAL_STORAGE: &str = ".boutique/local_storage.json";

/// Number used for checkout when the settings row is unavailable.
pub const DEFAULT_FALLBACK_WHATSAPP: &str = "+237695959595";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `pretty` or `json`, got `{other}`")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend connection settings
    pub gateway: GatewayConfig,
    /// File backing client-local storage (anonymous id, session)
    pub local_storage_path: PathBuf,
    /// WhatsApp number used when settings cannot be loaded
    pub fallback_whatsapp: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let gateway = GatewayConfig::from_env()?;
        let local_storage_path =
            PathBuf::from(env::or_default("BOUTIQUE_LOCAL_STORAGE", DEFAULT_LOCAL_STORAGE));
        let fallback_whatsapp =
            env::or_default("BOUTIQUE_FALLBACK_WHATSAPP", DEFAULT_FALLBACK_WHATSAPP);
        let log_format = env::parsed_or_default("BOUTIQUE_LOG_FORMAT", LogFormat::Pretty)?;

        Ok(Self {
            gateway,
            local_storage_path,
            fallback_whatsapp,
            log_format,
            sentry_dsn: env::optional("SENTRY_DSN"),
            sentry_environment: env::optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for a given backend with every optional value defaulted.
    #[must_use]
    pub fn with_gateway(gateway: GatewayConfig) -> Self {
        Self {
            gateway,
            local_storage_path: PathBuf::from(DEFAULT_LOCAL_STORAGE),
            fallback_whatsapp: DEFAULT_FALLBACK_WHATSAPP.to_string(),
            log_format: LogFormat::Pretty,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

//! Application configuration loaded from environment variables.

use std::time::Duration;

use thiserror::Error;

/// Raised when an environment variable holds an unusable value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables (after loading a `.env` file, if any):
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; unset means the in-memory store
/// - `SEED_CATALOG`: seed the demo catalog into an empty database (default: `false`)
/// - `STRIPE_SECRET_KEY`: gateway key; empty disables real checkouts
/// - `STRIPE_API_BASE`: gateway API host (default: `"https://api.stripe.com"`)
/// - `BASE_URL`: public URL for gateway return links (default: `"http://127.0.0.1:{PORT}"`)
/// - `SESSION_TTL_SECS`: idle time before a cart binding is forgotten (default: two weeks)
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub seed_catalog: bool,
    pub stripe_secret_key: String,
    pub stripe_api_base: String,
    pub base_url: String,
    pub session_ttl: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("seed_catalog", &self.seed_catalog)
            .field("payments_enabled", &self.payments_enabled())
            .field("stripe_api_base", &self.stripe_api_base)
            .field("base_url", &self.base_url)
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

impl Config {
    /// Loads configuration from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(value) => value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    name: "PORT",
                    value,
                    reason: e.to_string(),
                }
            })?,
            None => defaults.port,
        };

        let seed_catalog = match non_empty("SEED_CATALOG") {
            Some(value) => value.trim().parse().map_err(|e: std::str::ParseBoolError| {
                ConfigError::Invalid {
                    name: "SEED_CATALOG",
                    value,
                    reason: e.to_string(),
                }
            })?,
            None => defaults.seed_catalog,
        };

        let session_ttl = match non_empty("SESSION_TTL_SECS") {
            Some(value) => value
                .trim()
                .parse()
                .map(Duration::from_secs)
                .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                    name: "SESSION_TTL_SECS",
                    value,
                    reason: e.to_string(),
                })?,
            None => defaults.session_ttl,
        };

        Ok(Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port,
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: non_empty("DATABASE_URL"),
            seed_catalog,
            stripe_secret_key: lookup("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_api_base: non_empty("STRIPE_API_BASE").unwrap_or(defaults.stripe_api_base),
            base_url: non_empty("BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| format!("http://127.0.0.1:{port}")),
            session_ttl,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns true when a gateway secret key is present.
    pub fn payments_enabled(&self) -> bool {
        !self.stripe_secret_key.trim().is_empty()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            seed_catalog: false,
            stripe_secret_key: String::new(),
            stripe_api_base: payment::stripe::DEFAULT_API_BASE.to_string(),
            base_url: "http://127.0.0.1:3000".to_string(),
            session_ttl: Duration::from_secs(14 * 24 * 60 * 60),
        }
    }
}

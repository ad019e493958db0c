//! Client configuration
//!
//! Values come from the environment with sensible defaults:
//!
//! | Variable | Default |
//! |---|---|
//! | `ARTISAN_API_BASE_URL` (or `ARTISAN_API_BASE`) | `http://localhost:8080` |
//! | `ARTISAN_HTTP_TIMEOUT_SECS` | `30` |
//!
//! # Example
//!
//! ```no_run
//! use artisan_studio_http::config::ClientConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! println!("API base: {}", config.base_url);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default API base
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held an unparseable value
    InvalidValue {
        /// Variable name
        var: String,
        /// Offending value
        value: String,
    },
    /// Configuration validation failed
    ValidationError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { var, value } => write!(f, "Invalid value for {var}: {value}"),
            Self::ValidationError(msg) => write!(f, "Configuration validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API base URL, without a trailing slash
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Load from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is unparseable or the result is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is unparseable or the result is invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base) = lookup("ARTISAN_API_BASE_URL").or_else(|| lookup("ARTISAN_API_BASE")) {
            let base = base.trim();
            if !base.is_empty() {
                config.base_url = base.trim_end_matches('/').to_string();
            }
        }

        if let Some(raw) = lookup("ARTISAN_HTTP_TIMEOUT_SECS") {
            config.timeout_secs = parse_var("ARTISAN_HTTP_TIMEOUT_SECS", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "base_url must start with http:// or https://, got {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parse one environment value.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if `raw` does not parse as `T`.
pub fn parse_var<T: std::str::FromStr>(var: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var: var.to_string(),
        value: raw.to_string(),
    })
}

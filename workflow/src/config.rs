//! Workflow configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `ARTISAN_PAGE_SIZE` | `24` (1..=100) |
//! | `ARTISAN_CHANNEL` | `instagram` |
//! | `ARTISAN_LANG` | `en` |
//! | `ARTISAN_TONE` | `Professional` |
//! | `ARTISAN_CURRENCY` | `INR` |

use artisan_studio_http::config::{ConfigError, parse_var};
use serde::{Deserialize, Serialize};

/// Workflow and catalog defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Catalog page size
    pub page_size: u32,
    /// Social channel for marketing posts
    pub channel: String,
    /// Language for generated text
    pub lang: String,
    /// Tone for generated text
    pub tone: String,
    /// Currency for new drafts
    pub currency: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            page_size: 24,
            channel: "instagram".to_string(),
            lang: "en".to_string(),
            tone: "Professional".to_string(),
            currency: "INR".to_string(),
        }
    }
}

impl WorkflowConfig {
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

        if let Some(raw) = lookup("ARTISAN_PAGE_SIZE") {
            config.page_size = parse_var("ARTISAN_PAGE_SIZE", &raw)?;
        }
        for (var, field) in [
            ("ARTISAN_CHANNEL", &mut config.channel),
            ("ARTISAN_LANG", &mut config.lang),
            ("ARTISAN_TONE", &mut config.tone),
            ("ARTISAN_CURRENCY", &mut config.currency),
        ] {
            if let Some(value) = lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                *field = value;
            }
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
        if !(1..=100).contains(&self.page_size) {
            return Err(ConfigError::ValidationError(format!(
                "page_size must be between 1 and 100, got {}",
                self.page_size
            )));
        }
        if self.channel.is_empty() || self.lang.is_empty() {
            return Err(ConfigError::ValidationError(
                "channel and lang cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

//! Client configuration
//!
//! Configuration can be built in code, read from the environment, or parsed
//! from TOML.
//!
//! # Environment variables
//!
//! - `STOREFRONT_BASE_URL`: API origin (default `http://localhost:8080`)
//! - `STOREFRONT_TIMEOUT_SECS`: transport timeout in seconds (default: none)
//! - `STOREFRONT_USER_AGENT`: `User-Agent` header value
//!
//! # Example
//!
//! ```
//! use storefront_client::ClientConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_toml_str(r#"
//!     base_url = "https://shop.example.com"
//!     request_timeout_secs = 10
//! "#)?;
//!
//! assert_eq!(config.base_url, "https://shop.example.com");
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default API origin
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Environment variable for the API origin
pub const BASE_URL_ENV: &str = "STOREFRONT_BASE_URL";

/// Environment variable for the transport timeout
pub const TIMEOUT_ENV: &str = "STOREFRONT_TIMEOUT_SECS";

/// Environment variable for the user agent
pub const USER_AGENT_ENV: &str = "STOREFRONT_USER_AGENT";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable holds an unusable value
    #[error("Invalid value for {var}: {value}")]
    InvalidEnvVar {
        /// Variable name
        var: String,
        /// Offending value
        value: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    Validation(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// HTTP client could not be built
    #[error("Failed to build HTTP transport: {0}")]
    Transport(String),
}

/// Storefront client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API origin, without a trailing slash
    pub base_url: String,
    /// Transport timeout in seconds; `None` leaves it to the HTTP client
    pub request_timeout_secs: Option<u64>,
    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            user_agent: concat!("storefront-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is malformed or the result fails validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvVar {
                var: TIMEOUT_ENV.to_string(),
                value: raw.clone(),
            })?;
            config.request_timeout_secs = Some(secs);
        }

        if let Ok(user_agent) = std::env::var(USER_AGENT_ENV) {
            config.user_agent = user_agent;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML
    ///
    /// # Errors
    ///
    /// Returns error if the TOML is malformed or the result fails validation
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "base_url must start with http:// or https://, got {}",
                self.base_url
            )));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation("user_agent cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Builder: set the API origin
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builder: set the transport timeout
    #[must_use]
    pub const fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Builder: set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Transport timeout as a `Duration`
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.user_agent.starts_with("storefront-client/"));
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = ClientConfig::default().with_base_url("localhost:8080");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = ClientConfig::default().with_request_timeout_secs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_blank_user_agent() {
        let config = ClientConfig::default().with_user_agent("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Test code
    fn test_toml_overrides_and_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_url = "https://shop.example.com"
            request_timeout_secs = 15
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://shop.example.com");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.user_agent, ClientConfig::default().user_agent);
    }

    #[test]
    fn test_toml_parse_error() {
        let result = ClientConfig::from_toml_str("base_url = [");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}

//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, configuration files, or defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// External API credentials configuration.
    pub credentials: CredentialsConfig,

    /// MAX reporting API configuration.
    pub max_api: MaxApiConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Configuration for external API credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// AppLovin MAX reporting API key. Found under Account > Keys in the
    /// AppLovin dashboard. Without it every tool call fails before any
    /// request is sent.
    pub applovin_api_key: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field(
                "applovin_api_key",
                &self.applovin_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Configuration for the MAX reporting API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxApiConfig {
    /// Scheme and host the report paths are joined onto. Overridable so
    /// tests can point the tools at a local server.
    pub base_url: String,
}

impl Default for MaxApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://r.applovin.com".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "applovin-max-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            credentials: CredentialsConfig::default(),
            max_api: MaxApiConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Server settings use the `MCP_` prefix (`MCP_SERVER_NAME`,
    /// `MCP_LOG_LEVEL`, `MCP_TRANSPORT`); the AppLovin credentials and
    /// endpoint use `APPLOVIN_API_KEY` and `APPLOVIN_BASE_URL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        // Load the AppLovin reporting key
        if let Ok(api_key) = std::env::var("APPLOVIN_API_KEY") {
            config.credentials.applovin_api_key = Some(api_key);
            info!("AppLovin API key loaded from environment");
        } else {
            warn!(
                "APPLOVIN_API_KEY not set - report requests will fail until it is \
                 provided (find your key under Account > Keys in the AppLovin dashboard)"
            );
        }

        if let Ok(base_url) = std::env::var("APPLOVIN_BASE_URL") {
            info!("MAX API base URL overridden: {}", base_url);
            config.max_api.base_url = base_url;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_credentials_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("APPLOVIN_API_KEY", "test_key_12345");
        }
        let config = Config::from_env();
        assert_eq!(
            config.credentials.applovin_api_key.as_deref(),
            Some("test_key_12345")
        );
        unsafe {
            std::env::remove_var("APPLOVIN_API_KEY");
        }
    }

    #[test]
    fn test_credentials_missing_is_none() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::remove_var("APPLOVIN_API_KEY");
        }
        let config = Config::from_env();
        assert!(config.credentials.applovin_api_key.is_none());
    }

    #[test]
    fn test_base_url_default_and_override() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::remove_var("APPLOVIN_BASE_URL");
        }
        let config = Config::from_env();
        assert_eq!(config.max_api.base_url, "https://r.applovin.com");

        unsafe {
            std::env::set_var("APPLOVIN_BASE_URL", "http://127.0.0.1:8080");
        }
        let config = Config::from_env();
        assert_eq!(config.max_api.base_url, "http://127.0.0.1:8080");
        unsafe {
            std::env::remove_var("APPLOVIN_BASE_URL");
        }
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let creds = CredentialsConfig {
            applovin_api_key: Some("super_secret_key".to_string()),
        };
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_key"));
    }

    #[test]
    fn test_config_default_has_no_key() {
        let config = Config::default();
        assert!(config.credentials.applovin_api_key.is_none());
    }
}

//! Configuration management for trello-mcp-auth
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::auth::callback::DEFAULT_CALLBACK_PORT;
use crate::auth::credentials::CredentialStore;
use crate::auth::request::DEFAULT_AUTHORIZE_URL;
use crate::error::{Result, TrelloAuthError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/trello-mcp.yaml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Authorization flow settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Trello REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// Authorization flow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Local port for the OAuth callback listener
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,

    /// How long to wait for the browser callback (seconds)
    #[serde(default = "default_auth_timeout")]
    pub timeout_seconds: u64,

    /// Trello authorization endpoint
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    /// Credential file location; defaults to `~/.trello_mcp_token.json`
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

fn default_callback_port() -> u16 {
    DEFAULT_CALLBACK_PORT
}

fn default_auth_timeout() -> u64 {
    120
}

fn default_authorize_url() -> String {
    DEFAULT_AUTHORIZE_URL.to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            callback_port: default_callback_port(),
            timeout_seconds: default_auth_timeout(),
            authorize_url: default_authorize_url(),
            token_file: None,
        }
    }
}

impl AuthConfig {
    /// Resolves the credential file path.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no `token_file` is configured and
    /// the home directory cannot be determined.
    pub fn token_file_path(&self) -> Result<PathBuf> {
        match &self.token_file {
            Some(path) => Ok(path.clone()),
            None => CredentialStore::default_path().ok_or_else(|| {
                TrelloAuthError::Config(
                    "could not determine home directory; set auth.token_file".to_string(),
                )
                .into()
            }),
        }
    }
}

/// Trello REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Trello REST API
    #[serde(default = "default_api_base")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_base() -> String {
    "https://api.trello.com/1".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
            timeout_seconds: default_api_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TrelloAuthError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| TrelloAuthError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(port) = std::env::var("TRELLO_MCP_CALLBACK_PORT") {
            if let Ok(value) = port.parse() {
                self.auth.callback_port = value;
            } else {
                tracing::warn!("Invalid TRELLO_MCP_CALLBACK_PORT: {}", port);
            }
        }

        if let Ok(timeout) = std::env::var("TRELLO_MCP_AUTH_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.auth.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid TRELLO_MCP_AUTH_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(url) = std::env::var("TRELLO_MCP_AUTHORIZE_URL") {
            self.auth.authorize_url = url;
        }

        if let Ok(path) = std::env::var("TRELLO_MCP_TOKEN_FILE") {
            if !path.is_empty() {
                self.auth.token_file = Some(PathBuf::from(path));
            }
        }

        if let Ok(base) = std::env::var("TRELLO_MCP_API_BASE") {
            self.api.base_url = base;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(path) = &cli.token_file {
            self.auth.token_file = Some(path.clone());
        }

        if let crate::cli::Commands::Login { port, timeout, .. } = &cli.command {
            if let Some(port) = port {
                self.auth.callback_port = *port;
            }
            if let Some(timeout) = timeout {
                self.auth.timeout_seconds = *timeout;
            }
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.auth.timeout_seconds == 0 {
            return Err(TrelloAuthError::Config(
                "auth.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        validate_http_url("auth.authorize_url", &self.auth.authorize_url)?;
        validate_http_url("api.base_url", &self.api.base_url)?;

        if self.api.timeout_seconds == 0 {
            return Err(TrelloAuthError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let url = url::Url::parse(value)
        .map_err(|e| TrelloAuthError::Config(format!("{field} is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(TrelloAuthError::Config(format!(
            "{field} must use http or https, got {}",
            url.scheme()
        ))
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::test_utils::{create_test_file, temp_dir};
    use serial_test::serial;

    const ENV_VARS: [&str; 5] = [
        "TRELLO_MCP_CALLBACK_PORT",
        "TRELLO_MCP_AUTH_TIMEOUT_SECONDS",
        "TRELLO_MCP_AUTHORIZE_URL",
        "TRELLO_MCP_TOKEN_FILE",
        "TRELLO_MCP_API_BASE",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    fn status_cli() -> Cli {
        Cli {
            command: Commands::Status { verify: false },
            ..Cli::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.auth.callback_port, 8765);
        assert_eq!(config.auth.timeout_seconds, 120);
        assert_eq!(config.auth.authorize_url, "https://trello.com/1/authorize");
        assert_eq!(config.api.base_url, "https://api.trello.com/1");
        assert!(config.auth.token_file.is_none());
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.auth.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_non_http_authorize_url() {
        let mut config = Config::default();
        config.auth.authorize_url = "ftp://trello.com/1/authorize".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_unparseable_api_base() {
        let mut config = Config::default();
        config.api.base_url = "::not a url::".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
auth:
  callback_port: 9000
  timeout_seconds: 30
  token_file: /tmp/trello.json
"#;
        let config: Config = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(config.auth.callback_port, 9000);
        assert_eq!(config.auth.timeout_seconds, 30);
        assert_eq!(config.auth.token_file, Some(PathBuf::from("/tmp/trello.json")));
        assert_eq!(config.auth.authorize_url, "https://trello.com/1/authorize");
        assert_eq!(config.api.timeout_seconds, 30);
    }

    #[test]
    fn test_token_file_path_prefers_configured_path() {
        let config = AuthConfig {
            token_file: Some(PathBuf::from("/tmp/custom.json")),
            ..AuthConfig::default()
        };
        assert_eq!(
            config.token_file_path().expect("path"),
            PathBuf::from("/tmp/custom.json")
        );
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        clear_env();
        let config = Config::load("/nonexistent/trello-mcp.yaml", &status_cli()).expect("load");
        assert_eq!(config.auth.callback_port, 8765);
    }

    #[test]
    #[serial]
    fn test_load_reads_yaml_file() {
        clear_env();
        let dir = temp_dir();
        let path = create_test_file(&dir, "config.yaml", "auth:\n  callback_port: 9100\n");
        let config = Config::load(path.to_str().expect("utf8"), &status_cli()).expect("load");
        assert_eq!(config.auth.callback_port, 9100);
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides_fields() {
        clear_env();
        std::env::set_var("TRELLO_MCP_CALLBACK_PORT", "9200");
        std::env::set_var("TRELLO_MCP_AUTH_TIMEOUT_SECONDS", "15");
        std::env::set_var("TRELLO_MCP_TOKEN_FILE", "/tmp/env-token.json");

        let mut config = Config::default();
        config.apply_env_vars();
        clear_env();

        assert_eq!(config.auth.callback_port, 9200);
        assert_eq!(config.auth.timeout_seconds, 15);
        assert_eq!(config.auth.token_file, Some(PathBuf::from("/tmp/env-token.json")));
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_ignores_invalid_port() {
        clear_env();
        std::env::set_var("TRELLO_MCP_CALLBACK_PORT", "not-a-port");

        let mut config = Config::default();
        config.apply_env_vars();
        clear_env();

        assert_eq!(config.auth.callback_port, 8765);
    }

    #[test]
    fn test_cli_overrides_win_for_login() {
        let cli = Cli {
            token_file: Some(PathBuf::from("/tmp/cli.json")),
            command: Commands::Login {
                api_key: None,
                port: Some(9300),
                timeout: Some(5),
                no_browser: false,
            },
            ..Cli::default()
        };
        let mut config = Config::default();
        config.apply_cli_overrides(&cli);

        assert_eq!(config.auth.callback_port, 9300);
        assert_eq!(config.auth.timeout_seconds, 5);
        assert_eq!(config.auth.token_file, Some(PathBuf::from("/tmp/cli.json")));
    }
}

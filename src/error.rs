//! Error types for trello-mcp-auth
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for trello-mcp-auth operations
///
/// The authorization variants mirror the failure modes of the interactive
/// token-capture flow. Only [`TrelloAuthError::Bind`] and
/// [`TrelloAuthError::AuthorizationInProgress`] abort an attempt before any
/// network exposure; timeouts and protocol anomalies are folded into a
/// "no token obtained" outcome by the coordinator.
#[derive(Error, Debug)]
pub enum TrelloAuthError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The callback listener could not bind its port
    #[error("Failed to bind OAuth callback server on port {port}: {source}")]
    Bind {
        /// Port that was requested
        port: u16,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// No callback arrived before the deadline
    #[error("Authorization timed out after {seconds} seconds")]
    Timeout {
        /// The configured wait bound
        seconds: u64,
    },

    /// The completion signal resolved without a captured token
    #[error("Authorization protocol anomaly: {0}")]
    ProtocolAnomaly(String),

    /// Writing the credential file or restricting its permissions failed
    #[error("Failed to persist credentials: {0}")]
    Persistence(String),

    /// The system browser could not be launched
    #[error("Failed to open browser: {0}")]
    BrowserLaunch(String),

    /// A second interactive attempt was started on a busy coordinator
    #[error("An authorization attempt is already in progress")]
    AuthorizationInProgress,

    /// An operation needed credentials that are not available
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    /// Non-success response from the Trello REST API
    #[error("Trello API returned {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TrelloAuthError {
    /// Returns `true` for failures that mean "the wait ended without a token".
    ///
    /// Callers treat these identically: retry, fall back to the manual flow,
    /// or give up.
    pub fn is_no_token(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ProtocolAnomaly(_))
    }
}

/// Result type alias for application plumbing
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = TrelloAuthError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_bind_error_display_names_port() {
        let error = TrelloAuthError::Bind {
            port: 8765,
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };
        let s = error.to_string();
        assert!(s.contains("8765"));
        assert!(s.contains("address in use"));
    }

    #[test]
    fn test_timeout_error_display() {
        let error = TrelloAuthError::Timeout { seconds: 120 };
        assert_eq!(error.to_string(), "Authorization timed out after 120 seconds");
    }

    #[test]
    fn test_in_progress_error_display() {
        let error = TrelloAuthError::AuthorizationInProgress;
        assert_eq!(
            error.to_string(),
            "An authorization attempt is already in progress"
        );
    }

    #[test]
    fn test_api_error_display() {
        let error = TrelloAuthError::Api {
            status: 401,
            body: "invalid token".to_string(),
        };
        assert_eq!(error.to_string(), "Trello API returned 401: invalid token");
    }

    #[test]
    fn test_is_no_token_classification() {
        assert!(TrelloAuthError::Timeout { seconds: 1 }.is_no_token());
        assert!(TrelloAuthError::ProtocolAnomaly("x".to_string()).is_no_token());
        assert!(!TrelloAuthError::AuthorizationInProgress.is_no_token());
        assert!(!TrelloAuthError::Persistence("disk full".to_string()).is_no_token());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: TrelloAuthError = io_error.into();
        assert!(matches!(error, TrelloAuthError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: TrelloAuthError = json_error.into();
        assert!(matches!(error, TrelloAuthError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: TrelloAuthError = yaml_error.into();
        assert!(matches!(error, TrelloAuthError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TrelloAuthError>();
    }
}

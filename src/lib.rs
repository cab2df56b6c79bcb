//! trello-mcp-auth - Trello credentials for the Trello MCP server
//!
//! This library captures a Trello user token through the browser-based
//! implicit grant, persists it alongside the API key, and exposes the pair to
//! code that calls the Trello REST API.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: Authorization URL, local callback listener, interactive flow and
//!   credential storage
//! - `api`: Authenticated Trello REST requests
//! - `commands`: Handlers behind the CLI subcommands
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use trello_mcp_auth::auth::{AuthState, AuthorizationCoordinator, CredentialStore, EnvOverride};
//! use trello_mcp_auth::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/trello-mcp.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let store = CredentialStore::new(config.auth.token_file_path()?, EnvOverride::from_env());
//!     let state = Arc::new(AuthState::load(store));
//!     let coordinator = AuthorizationCoordinator::from_config(&config.auth, state)?;
//!     let token = coordinator
//!         .authorize_interactive("ABCD1234", config.auth.callback_port, Duration::from_secs(120))
//!         .await?;
//!     println!("token obtained: {}", token.is_some());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use auth::{
    AuthState, AuthorizationCoordinator, Credential, CredentialProvider, CredentialStore,
};
pub use config::Config;
pub use error::{Result, TrelloAuthError};

#[cfg(test)]
pub mod test_utils;

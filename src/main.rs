//! trello-mcp-auth - Trello credentials for the Trello MCP server
//!
#![doc = "Main entry point for the trello-mcp-auth command."]

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trello_mcp_auth::auth::credentials::{AuthState, CredentialStore, EnvOverride};
use trello_mcp_auth::cli::{Cli, Commands};
use trello_mcp_auth::commands::{self, ReadlinePrompt};
use trello_mcp_auth::config::{Config, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let store = CredentialStore::new(config.auth.token_file_path()?, EnvOverride::from_env());
    tracing::debug!(path = %store.path().display(), "Using credential file");
    let state = Arc::new(AuthState::load(store));

    // Execute command
    match cli.command {
        Commands::Login {
            api_key,
            no_browser,
            ..
        } => {
            tracing::info!("Starting interactive Trello authorization");
            let mut prompt = ReadlinePrompt::new()?;
            commands::auth::login(&config, state, api_key, no_browser, &mut prompt).await
        }
        Commands::Manual { api_key } => {
            tracing::info!("Starting manual Trello authorization");
            let mut prompt = ReadlinePrompt::new()?;
            commands::auth::manual(&config, &state, api_key, &mut prompt)
        }
        Commands::Status { verify } => commands::auth::status(&config, state, verify).await,
        Commands::Set { key, token } => commands::auth::set(&state, key, token),
        Commands::Url {
            api_key,
            return_url,
        } => commands::auth::url(&config, &state, api_key, return_url),
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so stdout stays usable for command output such as the
/// printed authorization URL.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose {
        "trello_mcp_auth=debug"
    } else {
        "trello_mcp_auth=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

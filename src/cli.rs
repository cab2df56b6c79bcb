//! Command-line interface definition for trello-mcp-auth
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive login, manual token entry,
//! status checks, and direct credential storage.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// trello-mcp-auth - Trello credentials for the Trello MCP server
///
/// Obtains a Trello user token through the browser, stores it alongside
/// the API key, and reports the current authentication state.
#[derive(Parser, Debug, Clone)]
#[command(name = "trello-mcp-auth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the credential file location
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Authorize in the browser and capture the token automatically
    Login {
        /// Trello API key (from https://trello.com/app-key); defaults to
        /// TRELLO_API_KEY or a prompt
        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// Port for the OAuth callback listener
        #[arg(short, long)]
        port: Option<u16>,

        /// Seconds to wait for the browser callback
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Only print the authorization URL; do not launch a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Print the authorization URL and paste the token by hand
    Manual {
        /// Trello API key; defaults to TRELLO_API_KEY or a prompt
        #[arg(short = 'k', long)]
        api_key: Option<String>,
    },

    /// Check current authentication status
    Status {
        /// Also call the Trello API to confirm the token works
        #[arg(long)]
        verify: bool,
    },

    /// Store an API key and token directly
    Set {
        /// Trello API key
        #[arg(long = "key")]
        key: String,

        /// Trello user token
        #[arg(long)]
        token: String,
    },

    /// Print the authorization URL without starting a listener
    Url {
        /// Trello API key; defaults to TRELLO_API_KEY
        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// Redirect target to include as `return_url`
        #[arg(long)]
        return_url: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: None,
            verbose: false,
            json_logs: false,
            token_file: None,
            command: Commands::Status { verify: false },
        }
    }
}

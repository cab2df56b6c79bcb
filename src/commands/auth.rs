//! Handlers for the credential commands: `login`, `manual`, `status`,
//! `set` and `url`.

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use url::Url;

use crate::api::TrelloClient;
use crate::auth::browser::NoBrowser;
use crate::auth::credentials::{mask_secret, AuthState, Credential};
use crate::auth::AuthorizationCoordinator;
use crate::commands::prompt::LinePrompt;
use crate::config::Config;
use crate::error::{Result, TrelloAuthError};

const APP_KEY_URL: &str = "https://trello.com/app-key";

/// Interactive browser login.
///
/// # Arguments
///
/// * `config` - Loaded configuration (port, timeout and endpoint)
/// * `state` - Credential state updated on success
/// * `api_key` - `--api-key` value, if given
/// * `no_browser` - Only print the URL
/// * `prompt` - Used when no API key is known yet
///
/// # Errors
///
/// Fails when no API key is available, when the callback port cannot be
/// bound, or when no token was obtained.
pub async fn login(
    config: &Config,
    state: Arc<AuthState>,
    api_key: Option<String>,
    no_browser: bool,
    prompt: &mut dyn LinePrompt,
) -> Result<()> {
    let api_key = resolve_api_key(api_key, &state, prompt)?;
    let port = config.auth.callback_port;
    let timeout = Duration::from_secs(config.auth.timeout_seconds);

    let mut coordinator =
        AuthorizationCoordinator::from_config(&config.auth, Arc::clone(&state))?;
    if no_browser {
        coordinator = coordinator.with_browser(NoBrowser);
    }

    println!("{}", "Trello authorization".bold());
    println!("API key: {}", mask_secret(&api_key, 8).cyan());

    let token = match coordinator.authorize_interactive(&api_key, port, timeout).await {
        Ok(token) => token,
        Err(e @ TrelloAuthError::Bind { .. }) => {
            eprintln!(
                "{} port {} is unavailable; retry with --port <PORT>",
                "Error:".red().bold(),
                port
            );
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    match token {
        Some(token) => {
            println!(
                "{} token {}",
                "Authorized.".green().bold(),
                mask_secret(&token, 4)
            );
            report_saved(&state);
            Ok(())
        }
        None => {
            println!(
                "{} no token was received. Try `trello-mcp-auth manual` instead.",
                "Authorization failed:".red().bold()
            );
            Err(TrelloAuthError::NotAuthenticated("no token obtained".to_string()).into())
        }
    }
}

/// Manual flow: print the authorization URL and read the pasted token.
pub fn manual(
    config: &Config,
    state: &AuthState,
    api_key: Option<String>,
    prompt: &mut dyn LinePrompt,
) -> Result<()> {
    let api_key = resolve_api_key(api_key, state, prompt)?;
    let endpoint = parse_endpoint(config)?;
    let auth_url = crate::auth::request::build_authorization_url(&endpoint, &api_key, None);

    println!("Open this URL in your browser and approve access:");
    println!("  {}", auth_url.cyan());
    println!("Trello then shows a token on the page; paste it below.");

    let token = prompt
        .read_line("Token: ")?
        .filter(|t| !t.is_empty())
        .ok_or_else(|| TrelloAuthError::NotAuthenticated("no token entered".to_string()))?;

    // Failure is logged and recorded; reported below.
    let _ = state.set_credentials(Credential::new(api_key, token));
    report_saved(state);
    Ok(())
}

/// Reports whether a usable credential is present.
///
/// With `verify`, also asks Trello who owns the token.
///
/// # Errors
///
/// Returns [`TrelloAuthError::NotAuthenticated`] when no usable credential
/// exists, or the API error when verification fails.
pub async fn status(config: &Config, state: Arc<AuthState>, verify: bool) -> Result<()> {
    let credential = state.credential();
    println!("Credential file: {}", state.store().path().display());

    if !credential.is_authenticated() {
        println!("{} Not authenticated", "✗".red().bold());
        if credential.api_key.is_empty() {
            println!("  API key: {}", "<unset>".yellow());
        }
        if credential.token.is_empty() {
            println!("  Token:   {}", "<unset>".yellow());
        }
        println!("Run `trello-mcp-auth login` to authorize.");
        return Err(
            TrelloAuthError::NotAuthenticated("no API key and token pair".to_string()).into(),
        );
    }

    println!("{} Authenticated", "✓".green().bold());
    println!("  API key: {}", mask_secret(&credential.api_key, 8));
    println!("  Token:   {}", mask_secret(&credential.token, 4));

    if verify {
        let client = TrelloClient::new(&config.api, state)?;
        let member = client.current_member().await?;
        println!(
            "  Member:  {} ({})",
            member.username.cyan(),
            member.full_name.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Stores an API key and token as given.
pub fn set(state: &AuthState, key: String, token: String) -> Result<()> {
    if key.trim().is_empty() || token.trim().is_empty() {
        return Err(TrelloAuthError::Config(
            "both --key and --token must be non-empty".to_string(),
        )
        .into());
    }
    let _ = state.set_credentials(Credential::new(key.trim(), token.trim()));
    report_saved(state);
    Ok(())
}

/// Prints the authorization URL.
pub fn url(
    config: &Config,
    state: &AuthState,
    api_key: Option<String>,
    return_url: Option<String>,
) -> Result<()> {
    let api_key = api_key
        .filter(|k| !k.is_empty())
        .or_else(|| Some(state.credential().api_key).filter(|k| !k.is_empty()))
        .ok_or_else(|| {
            TrelloAuthError::Config(format!(
                "an API key is required; pass --api-key or set TRELLO_API_KEY ({APP_KEY_URL})"
            ))
        })?;
    let endpoint = parse_endpoint(config)?;
    println!(
        "{}",
        crate::auth::request::build_authorization_url(&endpoint, &api_key, return_url.as_deref())
    );
    Ok(())
}

/// Explicit argument, then the known key, then a prompt.
fn resolve_api_key(
    explicit: Option<String>,
    state: &AuthState,
    prompt: &mut dyn LinePrompt,
) -> Result<String> {
    if let Some(key) = explicit.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
        return Ok(key);
    }

    let known = state.credential().api_key;
    if !known.is_empty() {
        tracing::debug!("Using known API key {}", mask_secret(&known, 8));
        return Ok(known);
    }

    println!("Get your API key from {}", APP_KEY_URL.cyan());
    prompt
        .read_line("Trello API key: ")?
        .filter(|k| !k.is_empty())
        .ok_or_else(|| TrelloAuthError::Config("an API key is required".to_string()).into())
}

fn parse_endpoint(config: &Config) -> Result<Url> {
    Url::parse(&config.auth.authorize_url).map_err(|e| {
        TrelloAuthError::Config(format!(
            "invalid authorize_url {}: {e}",
            config.auth.authorize_url
        ))
        .into()
    })
}

/// Tells the operator whether the last credential update reached disk.
///
/// Returns `true` when it did.
fn report_saved(state: &AuthState) -> bool {
    let path = state.store().path();
    match state.last_save_error() {
        None => {
            println!(
                "{} saved to {}",
                "Credentials".green().bold(),
                path.display()
            );
            true
        }
        Some(reason) => {
            eprintln!(
                "{} credentials were not saved to {}: {}",
                "Warning:".yellow().bold(),
                path.display(),
                reason
            );
            false
        }
    }
}

//! Interactive Trello authorization
//!
//! [`AuthorizationCoordinator`] drives one browser-based token capture:
//!
//! 1. Bind a [`CallbackServer`] for a fresh [`CallbackSession`].
//! 2. Build the authorization URL with `return_url=http://localhost:<port>`.
//! 3. Open the browser and print the URL as a manual fallback.
//! 4. Wait for the session's completion signal, bounded by a timeout.
//! 5. Persist the captured token through [`AuthState`].
//!
//! The callback server is stopped before `authorize_interactive` returns on
//! every path.  If the future is dropped mid-wait, the server's `Drop`
//! aborts its task instead.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use url::Url;

use crate::auth::browser::{BrowserLauncher, SystemBrowser};
use crate::auth::callback::{CallbackServer, CallbackSession, CompletionSignal, WaitOutcome};
use crate::auth::credentials::{mask_secret, AuthState, Credential};
use crate::auth::request::build_authorization_url;
use crate::config::AuthConfig;
use crate::error::TrelloAuthError;

/// Default bound on the wait for the browser callback.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Orchestrates the interactive authorization flow.
///
/// Only one [`authorize_interactive`](Self::authorize_interactive) call may
/// run at a time per coordinator; an overlapping call fails with
/// [`TrelloAuthError::AuthorizationInProgress`].
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use url::Url;
/// use trello_mcp_auth::auth::coordinator::AuthorizationCoordinator;
/// use trello_mcp_auth::auth::credentials::{AuthState, CredentialStore, EnvOverride};
///
/// # async fn example() -> Result<(), trello_mcp_auth::TrelloAuthError> {
/// let store = CredentialStore::new("/tmp/token.json", EnvOverride::from_env());
/// let state = Arc::new(AuthState::load(store));
/// let endpoint = Url::parse("https://trello.com/1/authorize").unwrap();
/// let coordinator = AuthorizationCoordinator::new(state, endpoint);
///
/// match coordinator
///     .authorize_interactive("ABCD1234", 8765, Duration::from_secs(120))
///     .await?
/// {
///     Some(_token) => println!("authorized"),
///     None => println!("no token obtained"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct AuthorizationCoordinator {
    auth_state: Arc<AuthState>,
    authorize_endpoint: Url,
    browser: Box<dyn BrowserLauncher>,
    in_flight: Mutex<()>,
}

impl AuthorizationCoordinator {
    /// Creates a coordinator that opens the system browser.
    pub fn new(auth_state: Arc<AuthState>, authorize_endpoint: Url) -> Self {
        Self {
            auth_state,
            authorize_endpoint,
            browser: Box::new(SystemBrowser),
            in_flight: Mutex::new(()),
        }
    }

    /// Creates a coordinator from the `auth` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`TrelloAuthError::Config`] if the configured authorize URL
    /// does not parse.
    pub fn from_config(
        config: &AuthConfig,
        auth_state: Arc<AuthState>,
    ) -> Result<Self, TrelloAuthError> {
        let endpoint = Url::parse(&config.authorize_url).map_err(|e| {
            TrelloAuthError::Config(format!(
                "invalid authorize_url {}: {e}",
                config.authorize_url
            ))
        })?;
        Ok(Self::new(auth_state, endpoint))
    }

    /// Replaces the browser launcher.
    pub fn with_browser(mut self, browser: impl BrowserLauncher + 'static) -> Self {
        self.browser = Box::new(browser);
        self
    }

    /// Credential state updated on success.
    pub fn auth_state(&self) -> &Arc<AuthState> {
        &self.auth_state
    }

    /// Builds the provider authorization URL.  No network access.
    pub fn build_authorization_url(&self, api_key: &str, return_url: Option<&str>) -> String {
        build_authorization_url(&self.authorize_endpoint, api_key, return_url)
    }

    /// Runs the browser flow and returns the captured token.
    ///
    /// Returns `Ok(None)` when no token was obtained (timeout or a signal
    /// without a token); details are logged.  On success the
    /// `{api_key, token}` pair is stored, overwriting any previous
    /// credential.  A failure to persist is logged, recorded in
    /// [`AuthState::last_save_error`], and does not change the result.
    ///
    /// # Errors
    ///
    /// - [`TrelloAuthError::Bind`] if `port` is unavailable.  Choose another
    ///   port; there is no retry loop.
    /// - [`TrelloAuthError::AuthorizationInProgress`] if another call on this
    ///   coordinator is still running.
    pub async fn authorize_interactive(
        &self,
        api_key: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Option<String>, TrelloAuthError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| TrelloAuthError::AuthorizationInProgress)?;

        tracing::info!("Starting local OAuth callback server on port {}...", port);
        let (session, signal) = CallbackSession::new(port);
        let server = CallbackServer::start(Arc::clone(&session)).await?;
        tracing::info!("OAuth callback server started successfully");

        let outcome = self
            .await_callback(api_key, &server, &session, signal, timeout)
            .await;
        server.stop().await;

        match outcome {
            Ok(token) => {
                tracing::info!(api_key = %mask_secret(api_key, 8), "Authorization token received");
                // Reported through AuthState::last_save_error; the token stays
                // usable in memory.
                let _ = self
                    .auth_state
                    .set_credentials(Credential::new(api_key, token.as_str()));
                Ok(Some(token))
            }
            Err(TrelloAuthError::Timeout { seconds }) => {
                tracing::error!(
                    "Authorization timeout - no response received within {} seconds",
                    seconds
                );
                Ok(None)
            }
            Err(TrelloAuthError::ProtocolAnomaly(detail)) => {
                tracing::error!("Callback received but no token found: {}", detail);
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    async fn await_callback(
        &self,
        api_key: &str,
        server: &CallbackServer,
        session: &CallbackSession,
        signal: CompletionSignal,
        timeout: Duration,
    ) -> Result<String, TrelloAuthError> {
        let return_url = format!("http://localhost:{}", server.port());
        let auth_url = self.build_authorization_url(api_key, Some(&return_url));

        tracing::info!("Attempting to open browser...");
        match self.browser.open(&auth_url) {
            Ok(()) => tracing::info!("Browser open command sent"),
            Err(e) => tracing::warn!("{}", e),
        }
        eprintln!(
            "Open the following URL in your browser to authorize Trello access:\n  {}",
            auth_url
        );

        tracing::info!(
            "Waiting for authorization (timeout: {} seconds)...",
            timeout.as_secs()
        );
        match signal.wait(timeout).await {
            WaitOutcome::Fired => session.captured_token().ok_or_else(|| {
                TrelloAuthError::ProtocolAnomaly(
                    "completion signal fired without a captured token".to_string(),
                )
            }),
            WaitOutcome::Abandoned => Err(TrelloAuthError::ProtocolAnomaly(
                "callback session closed before delivering a token".to_string(),
            )),
            WaitOutcome::TimedOut => Err(TrelloAuthError::Timeout {
                seconds: timeout.as_secs(),
            }),
        }
    }
}

//! Local HTTP callback server for Trello's implicit-grant redirect
//!
//! Trello returns the token in the URL fragment (`#token=...`), which a
//! browser never sends to a server.  Capturing it therefore takes two
//! requests against the same listener:
//!
//! 1. `GET /` is the redirect target.  The server answers with a relay page
//!    whose script reads `location.hash` and re-requests the origin with the
//!    token moved into the query string.
//! 2. `GET /?token=<value>` stores the token in the [`CallbackSession`],
//!    fires its completion signal, and answers with a success page.
//!
//! Requests are never logged with their URI; the token must not end up in
//! log output.
//!
//! The listener binds the IPv4 loopback address `127.0.0.1` only, while the
//! redirect target is `http://localhost:<port>`.  On hosts where `localhost`
//! resolves to `::1` first, the browser reaches the listener through its
//! IPv4 fallback for `localhost`; nothing outside the loopback interface can
//! connect.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::TrelloAuthError;

/// Default port for the local callback listener.
pub const DEFAULT_CALLBACK_PORT: u16 = 8765;

/// How long [`CallbackServer::stop`] waits for in-flight responses to flush
/// before aborting the accept loop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const LISTEN_BACKLOG: u32 = 128;

// ---------------------------------------------------------------------------
// CallbackSession
// ---------------------------------------------------------------------------

struct SessionInner {
    captured_token: Option<String>,
    signal: Option<oneshot::Sender<()>>,
}

/// State shared between one authorization attempt and its HTTP handler.
///
/// Created per attempt by the coordinator and handed to the router as
/// state.  The captured token is written and the signal fired inside one
/// critical section, so a waiter woken by the signal always sees the token.
pub struct CallbackSession {
    port: u16,
    inner: Mutex<SessionInner>,
    fire_count: AtomicUsize,
}

impl CallbackSession {
    /// Creates a session for `port` and the receiving half of its
    /// completion signal.
    pub fn new(port: u16) -> (Arc<Self>, CompletionSignal) {
        let (tx, rx) = oneshot::channel();
        let session = Arc::new(Self {
            port,
            inner: Mutex::new(SessionInner {
                captured_token: None,
                signal: Some(tx),
            }),
            fire_count: AtomicUsize::new(0),
        });
        (session, CompletionSignal { rx })
    }

    /// Port requested for this session.  `0` means "any free port"; the
    /// actual port is reported by [`CallbackServer::port`].
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Records a delivered token and fires the completion signal.
    ///
    /// Only the first delivery counts; later calls leave the captured token
    /// untouched and return `false`.
    pub fn deliver(&self, token: &str) -> bool {
        let mut inner = self.lock();
        let Some(signal) = inner.signal.take() else {
            return false;
        };
        inner.captured_token = Some(token.to_string());
        self.fire_count.fetch_add(1, Ordering::SeqCst);
        // The waiter may already have timed out and dropped the receiver.
        let _ = signal.send(());
        true
    }

    /// Token captured so far, if any.
    pub fn captured_token(&self) -> Option<String> {
        self.lock().captured_token.clone()
    }

    /// Whether the completion signal has fired.
    pub fn has_fired(&self) -> bool {
        self.fire_count() > 0
    }

    /// Number of times the completion signal fired; never more than one.
    pub fn fire_count(&self) -> usize {
        self.fire_count.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// How a wait on a [`CompletionSignal`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The session delivered a token.
    Fired,
    /// The session was dropped without ever firing.
    Abandoned,
    /// The deadline passed first.
    TimedOut,
}

/// Single-consumer receiving half of a session's completion signal.
#[derive(Debug)]
pub struct CompletionSignal {
    rx: oneshot::Receiver<()>,
}

impl CompletionSignal {
    /// Waits for the signal for at most `timeout`.
    ///
    /// A signal that already fired is reported even with a zero timeout.
    pub async fn wait(self, timeout: Duration) -> WaitOutcome {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(())) => WaitOutcome::Fired,
            Ok(Err(_)) => WaitOutcome::Abandoned,
            Err(_) => WaitOutcome::TimedOut,
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP handlers
// ---------------------------------------------------------------------------

const RELAY_PAGE: &str = r#"<html>
<head><title>Trello Authorization</title></head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 50px auto; padding: 20px;">
    <h2 style="color: #0079bf;">Processing authorization...</h2>
    <p>Please wait while we capture your token...</p>
    <script>
        const hash = window.location.hash.substring(1);
        const params = new URLSearchParams(hash);
        const token = params.get('token');

        if (token) {
            fetch('/?token=' + encodeURIComponent(token))
                .then(response => response.text())
                .then(html => {
                    document.open();
                    document.write(html);
                    document.close();
                })
                .catch(err => {
                    document.body.innerHTML = '<h2 style="color: #c9372c;">✗ Error</h2><p>Failed to send token to server: ' + err.message + '</p>';
                });
        } else {
            document.body.innerHTML = '<h2 style="color: #c9372c;">✗ No Token Found</h2><p>No token was found in the URL. Please try the authorization process again.</p>';
        }
    </script>
</body>
</html>
"#;

const SUCCESS_PAGE: &str = r#"<html>
<head><title>Trello Authorization - Success</title></head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 50px auto; padding: 20px;">
    <h2 style="color: #0079bf;">✓ Authorization Successful!</h2>
    <p>Your Trello token has been received and saved.</p>
    <p>You can close this window and return to your MCP client.</p>
    <p style="color: #666; font-size: 14px; margin-top: 30px;">The Trello MCP server is now ready to use.</p>
</body>
</html>
"#;

const NOT_FOUND_PAGE: &str = r#"<html>
<head><title>Not Found</title></head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 50px auto; padding: 20px;">
    <h2>Not Found</h2>
</body>
</html>
"#;

/// Builds the callback router for `session`.
pub fn router(session: Arc<CallbackSession>) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .fallback(handle_not_found)
        .with_state(session)
}

/// Returns the first non-empty `token` value in a raw query string.
///
/// Blank values are ignored, so `/?token=` still gets the relay page.
fn token_from_query(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, value)| key == "token" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

async fn handle_root(
    State(session): State<Arc<CallbackSession>>,
    RawQuery(query): RawQuery,
) -> Html<&'static str> {
    match token_from_query(query.as_deref()) {
        Some(token) => {
            if session.deliver(&token) {
                tracing::info!(token_len = token.len(), "Received authorization callback");
            } else {
                tracing::debug!("Ignoring repeated token delivery");
            }
            Html(SUCCESS_PAGE)
        }
        None => {
            tracing::debug!("Serving token relay page");
            Html(RELAY_PAGE)
        }
    }
}

async fn handle_not_found() -> (StatusCode, Html<&'static str>) {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE))
}

// ---------------------------------------------------------------------------
// CallbackServer
// ---------------------------------------------------------------------------

/// Binds `127.0.0.1:<port>` with `SO_REUSEADDR` so a lingering socket from a
/// previous attempt does not block a retry.
fn bind_reusable(port: u16) -> std::io::Result<TcpListener> {
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))?;
    socket.listen(LISTEN_BACKLOG)
}

/// A running callback listener.
///
/// The accept loop runs on a background tokio task.  Call
/// [`stop`](Self::stop) to shut it down and release the port; dropping the
/// server without stopping it aborts the task as well.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use trello_mcp_auth::auth::callback::{CallbackServer, CallbackSession, WaitOutcome};
///
/// # async fn example() -> Result<(), trello_mcp_auth::TrelloAuthError> {
/// let (session, signal) = CallbackSession::new(8765);
/// let server = CallbackServer::start(session.clone()).await?;
/// let outcome = signal.wait(Duration::from_secs(120)).await;
/// server.stop().await;
/// if outcome == WaitOutcome::Fired {
///     println!("captured: {}", session.captured_token().is_some());
/// }
/// # Ok(())
/// # }
/// ```
pub struct CallbackServer {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Binds the session's port and starts serving in the background.
    ///
    /// Returns once the listener is bound.
    ///
    /// # Errors
    ///
    /// Returns [`TrelloAuthError::Bind`] if the port is unavailable.  No
    /// retry is attempted.
    pub async fn start(session: Arc<CallbackSession>) -> Result<Self, TrelloAuthError> {
        let port = session.port();
        let bind_error = |source| TrelloAuthError::Bind { port, source };

        let listener = bind_reusable(port).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(session);
        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                tracing::warn!("OAuth callback server exited with error: {}", e);
            }
        });

        tracing::debug!(port = local_addr.port(), "OAuth callback server listening");
        Ok(Self {
            local_addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Port the listener is bound to.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Shuts the listener down and waits until the port is released.
    ///
    /// In-flight responses get a short grace period; after that the accept
    /// loop is aborted.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
                tracing::warn!("OAuth callback server did not drain in time; aborting");
                task.abort();
                let _ = task.await;
            }
        }
        tracing::info!("OAuth callback server shut down");
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

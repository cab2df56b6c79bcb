use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use trello_mcp_auth::auth::browser::BrowserLauncher;
use trello_mcp_auth::auth::credentials::{AuthState, CredentialStore, EnvOverride};
use trello_mcp_auth::TrelloAuthError;

/// Credential state backed by `token.json` inside a fresh temp dir.
#[allow(dead_code)]
pub fn temp_auth_state() -> (TempDir, Arc<AuthState>) {
    let dir = TempDir::new().expect("failed to create tempdir");
    let store = CredentialStore::new(dir.path().join("token.json"), EnvOverride::default());
    (dir, Arc::new(AuthState::load(store)))
}

/// Credential state whose file path is an existing directory, so saving
/// always fails.
#[allow(dead_code)]
pub fn unwritable_auth_state() -> (TempDir, Arc<AuthState>) {
    let dir = TempDir::new().expect("failed to create tempdir");
    let store = CredentialStore::new(dir.path(), EnvOverride::default());
    (dir, Arc::new(AuthState::load(store)))
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    std::fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// A port that was free a moment ago.
#[allow(dead_code)]
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

/// HTTP client that ignores proxy settings from the environment.
#[allow(dead_code)]
pub fn local_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("reqwest client")
}

/// Plays the browser's part of the redirect.
///
/// Instead of launching anything it reads `return_url` from the
/// authorization URL, loads the relay page, then performs the request the
/// relay script would make with `token`.  With `token: None` it stops after
/// the relay page, like a browser whose fragment carried no token.
#[allow(dead_code)]
pub struct RelayBrowser {
    token: Option<String>,
    relay_seen: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl RelayBrowser {
    pub fn new(token: Option<&str>) -> (Self, Arc<AtomicBool>) {
        let relay_seen = Arc::new(AtomicBool::new(false));
        (
            Self {
                token: token.map(str::to_string),
                relay_seen: Arc::clone(&relay_seen),
            },
            relay_seen,
        )
    }
}

impl BrowserLauncher for RelayBrowser {
    fn open(&self, url: &str) -> Result<(), TrelloAuthError> {
        let auth_url =
            url::Url::parse(url).map_err(|e| TrelloAuthError::BrowserLaunch(e.to_string()))?;
        let return_url = auth_url
            .query_pairs()
            .find(|(key, _)| key == "return_url")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| TrelloAuthError::BrowserLaunch("no return_url".to_string()))?;
        // The listener is IPv4 only.
        let origin = return_url.replace("localhost", "127.0.0.1");

        let token = self.token.clone();
        let relay_seen = Arc::clone(&self.relay_seen);
        tokio::spawn(async move {
            let client = local_client();
            if let Ok(resp) = client.get(format!("{origin}/")).send().await {
                if let Ok(body) = resp.text().await {
                    relay_seen.store(body.contains("location.hash"), Ordering::SeqCst);
                }
            }
            if let Some(token) = token {
                let _ = client.get(format!("{origin}/?token={token}")).send().await;
            }
        });
        Ok(())
    }
}

//! Credential persistence and in-memory credential state
//!
//! Trello authenticates REST calls with an API key plus a user token.  This
//! module stores that pair as a small JSON file in the user's home directory
//! (owner read/write only) and layers process environment overrides on top.
//!
//! Environment values are captured once at startup in [`EnvOverride`] and
//! take precedence over the file.  A non-empty `TRELLO_TOKEN` short-circuits
//! file loading entirely.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::TrelloAuthError;

/// Environment variable holding the Trello API key.
pub const API_KEY_ENV: &str = "TRELLO_API_KEY";

/// Environment variable holding the Trello user token.
pub const TOKEN_ENV: &str = "TRELLO_TOKEN";

/// File name of the persisted credential file inside the home directory.
pub const TOKEN_FILE_NAME: &str = ".trello_mcp_token.json";

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// An API key and token pair.
///
/// Serialized as `{"api_key": ..., "token": ...}`.  Missing fields
/// deserialize as empty strings so a partially written file is still
/// readable.
///
/// # Examples
///
/// ```
/// use trello_mcp_auth::auth::credentials::Credential;
///
/// let credential = Credential::new("ABCD1234", "XYZ999");
/// assert!(credential.is_authenticated());
/// assert!(!Credential::new("ABCD1234", "").is_authenticated());
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Trello application API key.
    #[serde(default)]
    pub api_key: String,

    /// User token granted through the authorization flow.
    #[serde(default)]
    pub token: String,
}

impl Credential {
    /// Creates a credential from an API key and token.
    pub fn new(api_key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            token: token.into(),
        }
    }

    /// Returns `true` iff both the API key and the token are non-empty.
    pub fn is_authenticated(&self) -> bool {
        !self.api_key.is_empty() && !self.token.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &mask_secret(&self.api_key, 8))
            .field("token", &mask_secret(&self.token, 4))
            .finish()
    }
}

/// Returns a short, display-safe prefix of a secret.
///
/// Empty input renders as `<unset>` so operators can tell "missing" from
/// "short".
///
/// # Examples
///
/// ```
/// use trello_mcp_auth::auth::credentials::mask_secret;
///
/// assert_eq!(mask_secret("ABCD1234EFGH", 8), "ABCD1234...");
/// assert_eq!(mask_secret("", 8), "<unset>");
/// ```
pub fn mask_secret(secret: &str, visible: usize) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let prefix: String = secret.chars().take(visible).collect();
    format!("{prefix}...")
}

// ---------------------------------------------------------------------------
// EnvOverride
// ---------------------------------------------------------------------------

/// Credential values supplied through the process environment.
///
/// Read once at startup; later changes to the environment are not observed.
/// Empty variables are treated as unset.
#[derive(Clone, Default)]
pub struct EnvOverride {
    /// Value of `TRELLO_API_KEY`, if set and non-empty.
    pub api_key: Option<String>,

    /// Value of `TRELLO_TOKEN`, if set and non-empty.
    pub token: Option<String>,
}

impl EnvOverride {
    /// Captures `TRELLO_API_KEY` and `TRELLO_TOKEN` from the environment.
    pub fn from_env() -> Self {
        Self {
            api_key: non_empty(std::env::var(API_KEY_ENV).ok()),
            token: non_empty(std::env::var(TOKEN_ENV).ok()),
        }
    }
}

impl fmt::Debug for EnvOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvOverride")
            .field("api_key", &self.api_key.is_some())
            .field("token", &self.token.is_some())
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// CredentialStore
// ---------------------------------------------------------------------------

/// File-backed credential store with environment override.
///
/// # Examples
///
/// ```no_run
/// use trello_mcp_auth::auth::credentials::{Credential, CredentialStore, EnvOverride};
///
/// let path = CredentialStore::default_path().expect("home directory");
/// let store = CredentialStore::new(path, EnvOverride::from_env());
/// if let Err(e) = store.save(&Credential::new("ABCD1234", "XYZ999")) {
///     eprintln!("could not persist credentials: {e}");
/// }
/// let loaded = store.load();
/// ```
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    env: EnvOverride,
}

impl CredentialStore {
    /// Creates a store backed by `path`, consulting `env` before the file.
    pub fn new(path: impl Into<PathBuf>, env: EnvOverride) -> Self {
        Self {
            path: path.into(),
            env,
        }
    }

    /// Default credential file location: `~/.trello_mcp_token.json`.
    ///
    /// Returns `None` when no home directory can be determined.
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(TOKEN_FILE_NAME))
    }

    /// Path of the backing credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Environment values captured for this store.
    pub fn env(&self) -> &EnvOverride {
        &self.env
    }

    /// Loads the current credential.
    ///
    /// A non-empty environment token wins and the file is never read.
    /// Otherwise the token comes from the file and the API key from the
    /// environment when present, else from the file.  Returns `None` when no
    /// source yields a token.  An unreadable or malformed file is logged and
    /// treated as absent.
    pub fn load(&self) -> Option<Credential> {
        if let Some(token) = &self.env.token {
            tracing::debug!("Using Trello token from {}", TOKEN_ENV);
            return Some(Credential::new(
                self.env.api_key.clone().unwrap_or_default(),
                token.clone(),
            ));
        }

        let stored = match self.read_file() {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to load cached token: {}", e);
                return None;
            }
        };

        if stored.token.is_empty() {
            tracing::debug!(path = %self.path.display(), "Cached credential file has no token");
            return None;
        }

        tracing::info!("Loaded cached Trello token");
        let api_key = self.env.api_key.clone().unwrap_or(stored.api_key);
        Some(Credential::new(api_key, stored.token))
    }

    fn read_file(&self) -> Result<Option<Credential>, TrelloAuthError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Serializes `credential` over the backing file and restricts it to
    /// owner read/write.
    ///
    /// # Errors
    ///
    /// Returns [`TrelloAuthError::Persistence`] when the file cannot be
    /// written or its permissions cannot be set.  Callers log this and keep
    /// using the in-memory credential.
    pub fn save(&self, credential: &Credential) -> Result<(), TrelloAuthError> {
        let json = serde_json::to_string(credential)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                TrelloAuthError::Persistence(format!(
                    "failed to create {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(|e| {
            TrelloAuthError::Persistence(format!("failed to open {}: {e}", self.path.display()))
        })?;
        file.write_all(json.as_bytes()).map_err(|e| {
            TrelloAuthError::Persistence(format!("failed to write {}: {e}", self.path.display()))
        })?;

        // `mode` only applies on creation; an existing file keeps its bits.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| {
                    TrelloAuthError::Persistence(format!(
                        "failed to set permissions on {}: {e}",
                        self.path.display()
                    ))
                })?;
        }

        tracing::info!(path = %self.path.display(), "Saved Trello token to cache");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CredentialProvider / AuthState
// ---------------------------------------------------------------------------

/// Read access to the active credential for code that calls the Trello API.
///
/// The request layer only needs to know whether it may issue a call and
/// which key/token pair to attach; it never sees how the pair was obtained.
pub trait CredentialProvider: Send + Sync {
    /// Returns `true` iff both the API key and the token are non-empty.
    fn is_authenticated(&self) -> bool;

    /// Returns the current `(api_key, token)` pair.  Missing values are
    /// empty strings.
    fn get_credentials(&self) -> (String, String);
}

impl CredentialProvider for Credential {
    fn is_authenticated(&self) -> bool {
        Credential::is_authenticated(self)
    }

    fn get_credentials(&self) -> (String, String) {
        (self.api_key.clone(), self.token.clone())
    }
}

/// Process-wide credential state backed by a [`CredentialStore`].
///
/// Holds the credential in memory so it stays usable even when persisting
/// it fails.
#[derive(Debug)]
pub struct AuthState {
    store: CredentialStore,
    current: RwLock<Credential>,
    last_save_error: RwLock<Option<String>>,
}

impl AuthState {
    /// Builds the state from whatever `store` can load.
    ///
    /// When no token is available the environment API key, if any, is still
    /// kept so an interactive flow can start from it.
    pub fn load(store: CredentialStore) -> Self {
        let current = store.load().unwrap_or_else(|| Credential {
            api_key: store.env().api_key.clone().unwrap_or_default(),
            token: String::new(),
        });
        Self {
            store,
            current: RwLock::new(current),
            last_save_error: RwLock::new(None),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Snapshot of the in-memory credential.
    pub fn credential(&self) -> Credential {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replaces the in-memory credential and persists it.
    ///
    /// Existing credentials are overwritten without confirmation.
    /// Persistence failures are logged; the in-memory value is updated
    /// regardless and the error is returned for callers that want to
    /// surface it.
    pub fn set_credentials(&self, credential: Credential) -> Result<(), TrelloAuthError> {
        let result = self.store.save(&credential);
        if let Err(e) = &result {
            tracing::warn!("Failed to save token: {}", e);
        }
        *self
            .last_save_error
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) =
            result.as_ref().err().map(ToString::to_string);
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = credential;
        result
    }

    /// Why the most recent [`set_credentials`](Self::set_credentials) could
    /// not persist, or `None` if it succeeded or none has run.
    ///
    /// Lets callers that did not see the `Result` (such as the interactive
    /// flow) tell the operator whether the credential reached disk.
    pub fn last_save_error(&self) -> Option<String> {
        self.last_save_error
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl CredentialProvider for AuthState {
    fn is_authenticated(&self) -> bool {
        self.credential().is_authenticated()
    }

    fn get_credentials(&self) -> (String, String) {
        let credential = self.credential();
        (credential.api_key, credential.token)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

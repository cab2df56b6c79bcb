//! Trello token authorization
//!
//! Trello issues user tokens through an implicit grant: the browser is sent
//! to `trello.com/1/authorize` and, on approval, redirected back with the
//! token in the URL fragment.  This module captures that token with a
//! short-lived local listener and persists it next to the API key.
//!
//! # Module Layout
//!
//! - [`browser`]     -- launching the system browser
//! - [`callback`]    -- per-attempt session state and the local HTTP listener
//! - [`coordinator`] -- the interactive flow: listener, browser, bounded wait
//! - [`credentials`] -- credential file, environment override, in-memory state
//! - [`request`]     -- authorization URL construction

pub mod browser;
pub mod callback;
pub mod coordinator;
pub mod credentials;
pub mod request;

pub use coordinator::AuthorizationCoordinator;
pub use credentials::{AuthState, Credential, CredentialProvider, CredentialStore, EnvOverride};

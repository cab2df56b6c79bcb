//! Trello authorization URL construction
//!
//! Trello's implicit grant is started by sending the browser to
//! `https://trello.com/1/authorize` with a fixed set of query parameters.
//! On approval Trello redirects to `return_url#token=<token>`, or shows the
//! token on its own page when no return URL is given.

use url::{form_urlencoded, Url};

/// Default Trello authorization endpoint.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://trello.com/1/authorize";

/// Scopes requested for every token.
pub const DEFAULT_SCOPES: [&str; 3] = ["read", "write", "account"];

/// Token lifetime requested from Trello.
pub const DEFAULT_EXPIRATION: &str = "never";

/// Parameters for one authorization URL.
///
/// Not persisted; exists only to render the URL.
///
/// # Examples
///
/// ```
/// use trello_mcp_auth::auth::request::AuthorizationRequest;
///
/// let request = AuthorizationRequest::new("ABCD1234")
///     .with_return_url("http://localhost:8765");
/// assert_eq!(request.scope, vec!["read", "write", "account"]);
/// assert_eq!(request.expiration, "never");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Trello application API key.
    pub api_key: String,

    /// Where Trello should redirect after approval.
    pub return_url: Option<String>,

    /// Requested scopes, joined with `,` on the wire.
    pub scope: Vec<String>,

    /// Requested token lifetime.
    pub expiration: String,
}

impl AuthorizationRequest {
    /// Creates a request with the default scopes and `expiration=never`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            return_url: None,
            scope: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            expiration: DEFAULT_EXPIRATION.to_string(),
        }
    }

    /// Sets the redirect target.
    pub fn with_return_url(mut self, return_url: impl Into<String>) -> Self {
        self.return_url = Some(return_url.into());
        self
    }

    /// Renders the request against `endpoint`.
    ///
    /// Parameter order is fixed: `expiration`, `scope`, `response_type`,
    /// `key`, then `return_url` only when one is set.  Any query already on
    /// `endpoint` is replaced.
    pub fn to_url(&self, endpoint: &Url) -> Url {
        // Scope separators stay literal commas; each scope name is encoded.
        let scope = self
            .scope
            .iter()
            .map(|s| encode(s))
            .collect::<Vec<_>>()
            .join(",");
        let mut query = format!(
            "expiration={}&scope={}&response_type=token&key={}",
            encode(&self.expiration),
            scope,
            encode(&self.api_key)
        );
        if let Some(return_url) = &self.return_url {
            query.push_str("&return_url=");
            query.push_str(&encode(return_url));
        }

        let mut url = endpoint.clone();
        url.set_query(Some(&query));
        url
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Builds the authorization URL for `api_key`, optionally redirecting to
/// `return_url`.
///
/// Deterministic and offline.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use trello_mcp_auth::auth::request::{build_authorization_url, DEFAULT_AUTHORIZE_URL};
///
/// let endpoint = Url::parse(DEFAULT_AUTHORIZE_URL).unwrap();
/// let url = build_authorization_url(&endpoint, "ABCD1234", None);
/// assert!(url.contains("key=ABCD1234"));
/// assert!(!url.contains("return_url"));
/// ```
pub fn build_authorization_url(endpoint: &Url, api_key: &str, return_url: Option<&str>) -> String {
    let mut request = AuthorizationRequest::new(api_key);
    if let Some(return_url) = return_url {
        request = request.with_return_url(return_url);
    }
    request.to_url(endpoint).to_string()
}

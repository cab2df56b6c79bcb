//! Authenticated Trello REST requests
//!
//! Every Trello call carries the API key and token as `key` / `token`
//! query parameters.  [`TrelloClient`] attaches them from a
//! [`CredentialProvider`] and refuses to send anything while the provider
//! is not authenticated.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method};
use serde::Deserialize;

use crate::auth::credentials::CredentialProvider;
use crate::config::ApiConfig;
use crate::error::TrelloAuthError;

const USER_AGENT: &str = concat!("trello-mcp-auth/", env!("CARGO_PKG_VERSION"));

/// The member that owns the current token, from `GET /members/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Trello member id.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Trello REST client bound to a credential provider.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use trello_mcp_auth::api::TrelloClient;
/// use trello_mcp_auth::auth::credentials::Credential;
/// use trello_mcp_auth::config::ApiConfig;
///
/// # async fn example() -> Result<(), trello_mcp_auth::TrelloAuthError> {
/// let credentials = Arc::new(Credential::new("ABCD1234", "XYZ999"));
/// let client = TrelloClient::new(&ApiConfig::default(), credentials)?;
/// let me = client.current_member().await?;
/// println!("{}", me.username);
/// # Ok(())
/// # }
/// ```
pub struct TrelloClient<P: CredentialProvider> {
    http: Client,
    base_url: String,
    credentials: Arc<P>,
}

impl<P: CredentialProvider> TrelloClient<P> {
    /// Creates a client for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`TrelloAuthError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, credentials: Arc<P>) -> Result<Self, TrelloAuthError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Sends an authenticated request and returns the JSON body.
    ///
    /// `endpoint` is appended to the base URL, e.g. `/boards/{id}`.
    ///
    /// # Errors
    ///
    /// - [`TrelloAuthError::NotAuthenticated`] without a usable credential.
    /// - [`TrelloAuthError::Api`] for non-success responses.
    /// - [`TrelloAuthError::Http`] for transport or decoding failures.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, TrelloAuthError> {
        if !self.credentials.is_authenticated() {
            return Err(TrelloAuthError::NotAuthenticated(
                "run `trello-mcp-auth login` or `trello-mcp-auth manual` first".to_string(),
            ));
        }
        let (api_key, token) = self.credentials.get_credentials();

        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .query(&[("key", api_key.as_str()), ("token", token.as_str())])
            .query(params);
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, endpoint, "Trello API request");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrelloAuthError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Fetches the member that owns the current token.
    pub async fn current_member(&self) -> Result<Member, TrelloAuthError> {
        let value = self.request(Method::GET, "/members/me", &[], None).await?;
        Ok(serde_json::from_value(value)?)
    }
}

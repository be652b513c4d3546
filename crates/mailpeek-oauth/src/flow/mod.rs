//! `OAuth2` grants: device authorization and refresh.

mod device;

pub use device::{DeviceAuthorization, DeviceFlow, DevicePrompt};

use crate::error::{Error, ProviderError, Result};
use crate::provider::Provider;
use crate::token::{AUTHORIZATION_PENDING, TokenPair, TokenResponse};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Grant type URN for the device authorization grant (RFC 8628).
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Grant type for the refresh token grant.
pub const REFRESH_TOKEN_GRANT_TYPE: &str = "refresh_token";

/// Body of a token endpoint request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenGrant<'a> {
    /// Poll for the outcome of a device authorization session.
    DeviceCode {
        /// Application (client) ID.
        client_id: &'a str,
        /// Device code from the authorization session.
        device_code: &'a str,
    },
    /// Exchange a refresh token for a new token pair.
    RefreshToken {
        /// Application (client) ID.
        client_id: &'a str,
        /// Stored refresh token.
        refresh_token: &'a str,
        /// Space-delimited scopes.
        scope: &'a str,
    },
}

impl<'a> TokenGrant<'a> {
    /// Returns the `grant_type` form value.
    #[must_use]
    pub const fn grant_type(&self) -> &'static str {
        match self {
            Self::DeviceCode { .. } => DEVICE_CODE_GRANT_TYPE,
            Self::RefreshToken { .. } => REFRESH_TOKEN_GRANT_TYPE,
        }
    }

    /// Returns the form-encoded parameters for this grant.
    #[must_use]
    pub fn form_params(&self) -> Vec<(&'static str, &'a str)> {
        match *self {
            Self::DeviceCode {
                client_id,
                device_code,
            } => vec![
                ("client_id", client_id),
                ("grant_type", DEVICE_CODE_GRANT_TYPE),
                ("device_code", device_code),
            ],
            Self::RefreshToken {
                client_id,
                refresh_token,
                scope,
            } => vec![
                ("grant_type", REFRESH_TOKEN_GRANT_TYPE),
                ("client_id", client_id),
                ("refresh_token", refresh_token),
                ("scope", scope),
            ],
        }
    }
}

/// The identity provider's two endpoints, as seen by the flows.
///
/// Implementations return the parsed JSON body regardless of HTTP status;
/// classification happens in the flows.
pub trait IdentityTransport {
    /// Requests a device authorization session.
    fn request_device_code(
        &self,
        client_id: &str,
        scope: &str,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// Submits a token request.
    fn request_token(&self, grant: &TokenGrant<'_>) -> impl Future<Output = Result<Value>> + Send;
}

/// HTTP transport for a provider's `OAuth2` endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Provider configuration.
    pub provider: Provider,
    /// HTTP client.
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(provider: Provider) -> Self {
        Self::with_http_client(provider, Client::new())
    }

    /// Creates an OAuth client sharing an existing HTTP client.
    #[must_use]
    pub const fn with_http_client(provider: Provider, http_client: Client) -> Self {
        Self {
            provider,
            http_client,
        }
    }

    async fn post_form(&self, url: &Url, params: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .http_client
            .post(url.clone())
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%url, %status, "Identity provider responded");

        serde_json::from_str(&body).map_err(|e| Error::InvalidResponse {
            reason: format!("HTTP {status} with non-JSON body: {e}"),
            payload: Value::String(body),
        })
    }
}

impl IdentityTransport for OAuthClient {
    async fn request_device_code(&self, client_id: &str, scope: &str) -> Result<Value> {
        let params = [("client_id", client_id), ("scope", scope)];
        self.post_form(&self.provider.device_auth_url, &params).await
    }

    async fn request_token(&self, grant: &TokenGrant<'_>) -> Result<Value> {
        self.post_form(&self.provider.token_url, &grant.form_params())
            .await
    }
}

/// Bounds on the device flow polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between token requests while authorization is pending.
    pub interval: Duration,
    /// Maximum number of token requests; `None` means bounded only by the
    /// device code lifetime.
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    /// Default delay between polls.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    /// Default attempt cap: 15 minutes at the default interval.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 180;

    /// Sets the poll interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the attempt cap.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_attempts: Some(Self::DEFAULT_MAX_ATTEMPTS),
        }
    }
}

/// Result of a refresh grant.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The provider issued a new pair.
    Refreshed(TokenPair),
    /// The provider answered without an access token.
    Rejected(ProviderError),
}

/// Exchanges a refresh token for a new token pair.
///
/// A response without an access token is a [`RefreshOutcome::Rejected`], not
/// an error; the stored tokens are no longer usable in that case. If the
/// provider does not rotate the refresh token, the old one is kept.
///
/// # Errors
///
/// Returns an error only if the transport fails.
pub async fn refresh<T: IdentityTransport>(
    transport: &T,
    client_id: &str,
    refresh_token: &str,
    scope: &str,
) -> Result<RefreshOutcome> {
    let grant = TokenGrant::RefreshToken {
        client_id,
        refresh_token,
        scope,
    };
    let response = transport.request_token(&grant).await?;

    match TokenResponse::classify(response) {
        TokenResponse::Issued(tokens) => {
            let rotated = tokens.refresh_token.is_some();
            info!(rotated, "Access token refreshed");
            Ok(RefreshOutcome::Refreshed(tokens.into_pair_or(refresh_token)))
        }
        TokenResponse::Pending(payload) => {
            warn!("Token endpoint answered a refresh with authorization_pending");
            Ok(RefreshOutcome::Rejected(ProviderError {
                error: AUTHORIZATION_PENDING.into(),
                description: "unexpected pending state for refresh grant".into(),
                payload,
            }))
        }
        TokenResponse::Rejected(err) => {
            warn!(error = %err, "Refresh token rejected");
            Ok(RefreshOutcome::Rejected(err))
        }
    }
}

//! `OAuth2` token types and token endpoint response classification.

use crate::error::{Error, ProviderError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error code returned while the user has not yet approved a device session.
pub const AUTHORIZATION_PENDING: &str = "authorization_pending";

/// Access token together with the refresh token issued alongside it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential.
    pub access_token: String,
    /// Long-lived credential used to obtain a new access token.
    pub refresh_token: String,
}

impl TokenPair {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Tokens are credentials; keep them out of logs and panic messages.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Tokens from a successful token endpoint response.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    /// Access token.
    pub access_token: String,
    /// Refresh token, if the provider returned one.
    pub refresh_token: Option<String>,
    payload: Value,
}

impl IssuedTokens {
    /// Converts into a full pair, failing if the provider sent no refresh token.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResponse` when `refresh_token` is missing, which
    /// usually means the requested scope lacked `offline_access`.
    pub fn into_pair(self) -> Result<TokenPair> {
        match self.refresh_token {
            Some(refresh_token) => Ok(TokenPair {
                access_token: self.access_token,
                refresh_token,
            }),
            None => Err(Error::InvalidResponse {
                reason: "response has no refresh_token (is offline_access in scope?)".into(),
                payload: self.payload,
            }),
        }
    }

    /// Converts into a full pair, keeping `previous` when the refresh token was not rotated.
    #[must_use]
    pub fn into_pair_or(self, previous: &str) -> TokenPair {
        TokenPair {
            access_token: self.access_token,
            refresh_token: self.refresh_token.unwrap_or_else(|| previous.to_owned()),
        }
    }
}

/// Wire shape shared by success and error responses from the token endpoint.
#[derive(Debug, Default, Deserialize)]
struct RawTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Classified token endpoint response.
#[derive(Debug, Clone)]
pub enum TokenResponse {
    /// The response carries an access token.
    Issued(IssuedTokens),
    /// The user has not approved the device session yet. Carries the raw body.
    Pending(Value),
    /// Anything else: an explicit error or a body without an access token.
    Rejected(ProviderError),
}

impl TokenResponse {
    /// Classifies a token endpoint response body by its content.
    ///
    /// The HTTP status is irrelevant here: providers answer pending and
    /// denied polls with 400 and a JSON body.
    #[must_use]
    pub fn classify(payload: Value) -> Self {
        let raw: RawTokenResponse = match serde_json::from_value(payload.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                return Self::Rejected(ProviderError {
                    error: "invalid_response".into(),
                    description: e.to_string(),
                    payload,
                });
            }
        };

        if let Some(access_token) = raw.access_token.filter(|t| !t.is_empty()) {
            return Self::Issued(IssuedTokens {
                access_token,
                refresh_token: raw.refresh_token.filter(|t| !t.is_empty()),
                payload,
            });
        }

        match raw.error {
            Some(error) if error == AUTHORIZATION_PENDING => Self::Pending(payload),
            Some(error) => Self::Rejected(ProviderError {
                error,
                description: raw.error_description.unwrap_or_default(),
                payload,
            }),
            None => Self::Rejected(ProviderError {
                error: "missing_access_token".into(),
                description: "token response contained neither access_token nor error".into(),
                payload,
            }),
        }
    }
}

//! Error types for `OAuth2` operations.

use std::fmt;

/// Result type alias for `OAuth2` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `OAuth2` error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The device authorization request failed or returned an unusable session.
    #[error("Device authorization request failed: {reason}")]
    AuthRequestFailed {
        /// What went wrong.
        reason: String,
        /// Raw provider payload, when one was received.
        payload: Option<serde_json::Value>,
    },

    /// The provider ended the device flow with an error other than `authorization_pending`.
    #[error("Authorization denied: {0}")]
    AuthDenied(ProviderError),

    /// The user did not approve the device session in time.
    #[error("Authorization timed out after {attempts} polling attempts")]
    PollTimeout {
        /// Number of token requests made before giving up.
        attempts: u32,
    },

    /// Invalid token response.
    #[error("Invalid token response: {reason}")]
    InvalidResponse {
        /// What the response was missing.
        reason: String,
        /// Raw provider payload.
        payload: serde_json::Value,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl Error {
    /// Creates an `AuthRequestFailed` error.
    #[must_use]
    pub fn auth_request_failed(
        reason: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self::AuthRequestFailed {
            reason: reason.into(),
            payload,
        }
    }

    /// Returns the raw provider payload attached to this error, if any.
    #[must_use]
    pub const fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            Self::AuthRequestFailed { payload, .. } => payload.as_ref(),
            Self::AuthDenied(err) => Some(&err.payload),
            Self::InvalidResponse { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

/// Error reported by the authorization server in a token endpoint response.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderError {
    /// Error code (e.g., `invalid_grant`).
    pub error: String,
    /// Human-readable description.
    pub description: String,
    /// The full response body as received.
    pub payload: serde_json::Value,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.error)
        } else {
            write!(f, "{} - {}", self.error, self.description)
        }
    }
}

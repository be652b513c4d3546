//! Error types for the core library.

use thiserror::Error;

use crate::credentials::StoreError;
use crate::service::MailError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Credential store failed to load or save.
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    /// Device authorization or token request failed.
    #[error("Authentication error: {0}")]
    Auth(#[from] mailpeek_oauth::Error),

    /// The stored refresh token was rejected; the tokens have been cleared.
    #[error("Token refresh failed: {0} (run again to sign in with a new device code)")]
    RefreshFailed(mailpeek_oauth::ProviderError),

    /// Mail fetch failed.
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

//! Credential storage.
//!
//! The credential record holds the client identity, the mailbox to read and
//! the current token pair. It is loaded once per run and rewritten as a
//! whole after every token change.

mod file;
mod model;

pub use file::JsonFileStore;
pub use model::CredentialRecord;

use std::future::Future;
use std::io;
use std::path::PathBuf;

/// Error type for credential store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing resource does not exist.
    #[error("Configuration not found at {}", .path.display())]
    ConfigMissing {
        /// Location that was read.
        path: PathBuf,
    },

    /// The backing resource exists but could not be read.
    #[error("Failed to read configuration at {}: {source}", .path.display())]
    ConfigUnreadable {
        /// Location that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The content does not match the credential record schema.
    #[error("Malformed configuration at {}: {reason}", .path.display())]
    ConfigMalformed {
        /// Location that was read.
        path: PathBuf,
        /// Parser or validation message.
        reason: String,
    },

    /// The record could not be written; tokens are not durably recorded.
    #[error("Failed to write configuration to {}: {source}", .path.display())]
    StorageWrite {
        /// Location that was written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Result type for credential store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable storage for a single credential record.
pub trait CredentialStore {
    /// Reads the full record.
    fn load(&self) -> impl Future<Output = StoreResult<CredentialRecord>> + Send;

    /// Replaces the stored record with `record`.
    fn save(&self, record: &CredentialRecord) -> impl Future<Output = StoreResult<()>> + Send;
}

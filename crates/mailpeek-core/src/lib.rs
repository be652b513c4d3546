//! # mailpeek-core
//!
//! Core logic for `mailpeek`.
//!
//! This crate provides:
//! - **Credential storage** - the client identity, mailbox and token pair,
//!   persisted as one JSON record
//! - **Token lifecycle** - device authorization on first run, silent refresh
//!   afterwards, with every new pair saved before use
//! - **Mail reader** - sender and preview of a mailbox's messages via
//!   Microsoft Graph
//! - **Service** - the whole run, from loading credentials to showing messages

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod credentials;
mod error;
pub mod lifecycle;
pub mod service;

pub use credentials::{CredentialRecord, CredentialStore, JsonFileStore, StoreError};
pub use error::{Error, Result};
pub use lifecycle::{Acquisition, TokenManager, TokenOutcome, TokenPath};
pub use service::{
    GraphClient, MailError, MailTransport, MessageSink, MessageSummary, Messages, fetch_messages,
    read_mailbox,
};

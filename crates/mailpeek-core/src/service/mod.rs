//! Core services for reading mail.
//!
//! This module ties the credential store, the token lifecycle and the mail
//! reader together into a single run.

pub mod mail;

pub use mail::{
    GraphClient, MailError, MailResult, MailTransport, MessageSink, MessageSummary, Messages,
    fetch_messages,
};

use mailpeek_oauth::{DevicePrompt, IdentityTransport};
use tracing::info;

use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::lifecycle::TokenManager;

/// Loads credentials, obtains an access token and shows the mailbox's messages.
///
/// Messages reach `ui` in the order the mail API returned them. Returns the
/// number of messages shown.
///
/// # Errors
///
/// Any store, authentication or mail error stops the run. A rejected refresh
/// surfaces as `Error::RefreshFailed` before the mail API is contacted.
pub async fn read_mailbox<T, S, M, U>(
    manager: &TokenManager<T, S>,
    mail: &M,
    ui: &U,
) -> Result<usize>
where
    T: IdentityTransport,
    S: CredentialStore,
    M: MailTransport,
    U: DevicePrompt + MessageSink + ?Sized,
{
    let record = manager.load().await?;
    let acquisition = manager.acquire(record, ui).await?;
    let tokens = acquisition.outcome.into_tokens()?;
    let mailbox = acquisition.record.user_principal_name();

    let messages = fetch_messages(mail, mailbox, &tokens.access_token).await?;
    let mut shown = 0;
    for message in messages {
        ui.show_message(&message);
        shown += 1;
    }

    info!("Showed {} messages", shown);
    Ok(shown)
}

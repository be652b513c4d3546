//! `mailpeek` - show who sent the messages in a Microsoft 365 mailbox
//!
//! Signs in with the `OAuth2` device flow on first run, refreshes silently
//! afterwards, and prints sender and preview of each message.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod console;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use mailpeek_core::{
    CredentialStore, Error, GraphClient, JsonFileStore, StoreError, TokenManager, read_mailbox,
};
use mailpeek_oauth::{OAuthClient, PollPolicy, Provider};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use console::ConsoleUi;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the prompt and the messages.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mailpeek=info,mailpeek_core=info,mailpeek_oauth=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(hint) = e.downcast_ref::<Error>().and_then(hint) {
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = cli
        .config
        .clone()
        .map_or_else(JsonFileStore::at_default_location, JsonFileStore::new);
    debug!(path = %store.path().display(), "Using credential file");

    // The tenant picks the token endpoints, so it is read before the run.
    let record = store
        .load()
        .await
        .map_err(Error::from)
        .with_context(|| format!("Could not load {}", store.path().display()))?;
    let provider = Provider::microsoft(record.tenant_id()).context("Invalid tenant_id")?;

    let policy = PollPolicy::default()
        .with_interval(Duration::from_secs(cli.poll_interval))
        .with_max_attempts(cli.max_attempts());
    let manager = TokenManager::new(OAuthClient::new(provider), store)
        .with_poll_policy(policy)
        .with_reauthorize_on_refresh_failure(cli.reauthorize);
    let ui = ConsoleUi::new(cli.open);

    let shown = read_mailbox(&manager, &GraphClient::new(), &ui).await?;
    info!("Done, {} messages", shown);
    Ok(())
}

/// Follow-up advice for errors the user can fix.
fn hint(error: &Error) -> Option<&'static str> {
    match error {
        Error::RefreshFailed(_) => {
            Some("The stored sign-in has been cleared. Run again to sign in with a new device code.")
        }
        Error::Store(StoreError::ConfigMissing { .. }) => Some(
            "Create the file with client_id, tenant_id, scope and user_principal_name, \
             or point --config at it.",
        ),
        Error::Auth(mailpeek_oauth::Error::PollTimeout { .. }) => {
            Some("Sign-in was not completed in time. Run again to get a new code.")
        }
        _ => None,
    }
}

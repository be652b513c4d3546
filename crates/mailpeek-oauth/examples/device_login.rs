#![allow(clippy::expect_used, clippy::doc_markdown)]
//! Example: Device Flow sign-in against the Microsoft identity platform
//!
//! Prints the verification URI and user code, then polls until the sign-in is
//! approved in a browser. Nothing is persisted; see the `mailpeek` binary for
//! the full flow with a credential file.
//!
//! ## Running
//!
//! ```bash
//! export OAUTH_CLIENT_ID="your-client-id-from-azure"
//! export OAUTH_TENANT_ID="common"
//! cargo run --package mailpeek-oauth --example device_login
//! ```

use mailpeek_oauth::{DeviceAuthorization, DeviceFlow, DevicePrompt, OAuthClient, Provider};
use std::env;
use std::io::Write;

struct Stdout;

impl DevicePrompt for Stdout {
    fn verification_required(&self, auth: &DeviceAuthorization) {
        println!("1. Visit: {}", auth.verification_uri);
        println!("2. Enter code: {}", auth.user_code);
        println!();
        println!("Waiting for you to complete authorization...");
    }

    fn waiting_for_approval(&self, _attempt: u32) {
        print!(".");
        let _ = std::io::stdout().flush();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client_id =
        env::var("OAUTH_CLIENT_ID").expect("OAUTH_CLIENT_ID environment variable not set");
    let tenant_id = env::var("OAUTH_TENANT_ID").unwrap_or_else(|_| "common".to_string());

    let client = OAuthClient::new(Provider::microsoft(&tenant_id)?);
    let tokens = DeviceFlow::new(&client, &client_id)
        .authorize("offline_access https://graph.microsoft.com/Mail.Read", &Stdout)
        .await?;

    println!("\n✓ Authorization successful! ({tokens:?})");
    Ok(())
}

//! # mailpeek-oauth
//!
//! `OAuth2` device-code authentication for command line mail tools.
//!
//! ## Features
//!
//! - **Device flow** (RFC 8628) with a bounded, injectable poll policy
//! - **Refresh grant** with a typed outcome instead of a null token
//! - **Provider configuration** for tenant-scoped Microsoft identity endpoints
//! - **Transport seam**: flows talk to an [`IdentityTransport`]; [`OAuthClient`]
//!   is the `reqwest` implementation
//!
//! ## Device Flow
//!
//! ```ignore
//! use mailpeek_oauth::{DeviceFlow, OAuthClient, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OAuthClient::new(Provider::microsoft("common")?);
//!     let flow = DeviceFlow::new(&client, "your_client_id");
//!
//!     let auth = flow.request_device_authorization("offline_access Mail.Read").await?;
//!     println!("Visit {} and enter {}", auth.verification_uri, auth.user_code);
//!
//!     let tokens = flow.poll_for_token(&auth, &()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Token Refresh
//!
//! ```ignore
//! match mailpeek_oauth::refresh(&client, client_id, &pair.refresh_token, scope).await? {
//!     RefreshOutcome::Refreshed(new_pair) => { /* persist new_pair */ }
//!     RefreshOutcome::Rejected(err) => { /* stored tokens are dead */ }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod token;

pub use error::{Error, ProviderError, Result};
pub use flow::{
    DeviceAuthorization, DeviceFlow, DevicePrompt, IdentityTransport, OAuthClient, PollPolicy,
    RefreshOutcome, TokenGrant, refresh,
};
pub use provider::Provider;
pub use token::{TokenPair, TokenResponse};

/// Silent prompt, for callers that surface the device session some other way.
impl DevicePrompt for () {
    fn verification_required(&self, _auth: &DeviceAuthorization) {}
}

//! Device Authorization Flow implementation (RFC 8628).

use super::{IdentityTransport, PollPolicy, TokenGrant};
use crate::error::{Error, Result};
use crate::token::{TokenPair, TokenResponse};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

/// Device authorization response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceAuthorization {
    /// Device code for polling.
    pub device_code: String,
    /// User code to display to the user.
    pub user_code: String,
    /// Verification URI where user should go.
    pub verification_uri: String,
    /// Lifetime of the device code in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Polling interval advertised by the provider, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    /// Ready-made instructions for the user, if the provider sends them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DeviceAuthorization {
    fn parse(payload: serde_json::Value) -> Result<Self> {
        let auth: Self = match serde_json::from_value(payload.clone()) {
            Ok(auth) => auth,
            Err(e) => return Err(Error::auth_request_failed(e.to_string(), Some(payload))),
        };

        if auth.device_code.is_empty()
            || auth.user_code.is_empty()
            || auth.verification_uri.is_empty()
        {
            return Err(Error::auth_request_failed(
                "device authorization response has empty fields",
                Some(payload),
            ));
        }
        Ok(auth)
    }
}

/// Output collaborator for the interactive part of the device flow.
pub trait DevicePrompt {
    /// Asks the user to visit `auth.verification_uri` and enter `auth.user_code`.
    fn verification_required(&self, auth: &DeviceAuthorization);

    /// Called each time a poll comes back `authorization_pending`.
    fn waiting_for_approval(&self, _attempt: u32) {}
}

/// Device Authorization Flow for `OAuth2`.
///
/// This flow is suitable for devices with limited input capabilities
/// or no browser (e.g., CLI applications).
#[derive(Debug)]
pub struct DeviceFlow<'a, T> {
    transport: &'a T,
    client_id: &'a str,
    policy: PollPolicy,
}

impl<'a, T: IdentityTransport> DeviceFlow<'a, T> {
    /// Creates a new device flow with the default poll policy.
    #[must_use]
    pub fn new(transport: &'a T, client_id: &'a str) -> Self {
        Self {
            transport,
            client_id,
            policy: PollPolicy::default(),
        }
    }

    /// Overrides the poll policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Requests device authorization from the server.
    ///
    /// # Errors
    ///
    /// Returns `Error::AuthRequestFailed` if the request fails or the response
    /// lacks `device_code`, `user_code` or `verification_uri`.
    pub async fn request_device_authorization(&self, scope: &str) -> Result<DeviceAuthorization> {
        let payload = self
            .transport
            .request_device_code(self.client_id, scope)
            .await
            .map_err(|e| {
                let payload = e.payload().cloned();
                Error::auth_request_failed(e.to_string(), payload)
            })?;

        let auth = DeviceAuthorization::parse(payload)?;
        info!(
            verification_uri = %auth.verification_uri,
            expires_in = ?auth.expires_in,
            "Device authorization session created"
        );
        Ok(auth)
    }

    /// Polls the token endpoint until the user approves the session.
    ///
    /// The first request goes out immediately; after each
    /// `authorization_pending` the flow sleeps for the larger of the policy
    /// interval and the provider's advertised interval.
    ///
    /// # Errors
    ///
    /// - `Error::AuthDenied` for any provider error other than `authorization_pending`.
    /// - `Error::PollTimeout` once the attempt cap or the device code lifetime is reached.
    /// - `Error::InvalidResponse` if the issued tokens lack a refresh token.
    /// - Transport errors as returned by the transport.
    pub async fn poll_for_token<P: DevicePrompt + ?Sized>(
        &self,
        auth: &DeviceAuthorization,
        prompt: &P,
    ) -> Result<TokenPair> {
        let interval = auth
            .interval
            .map(Duration::from_secs)
            .map_or(self.policy.interval, |advertised| {
                advertised.max(self.policy.interval)
            });
        // A lifetime past the clock's range means no deadline.
        let deadline = auth
            .expires_in
            .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)));
        let grant = TokenGrant::DeviceCode {
            client_id: self.client_id,
            device_code: &auth.device_code,
        };

        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);
            let response = self.transport.request_token(&grant).await?;

            match TokenResponse::classify(response) {
                TokenResponse::Issued(tokens) => {
                    info!(attempts, "Device authorization approved");
                    return tokens.into_pair();
                }
                TokenResponse::Rejected(err) => {
                    debug!(attempts, error = %err, "Device authorization failed");
                    return Err(Error::AuthDenied(err));
                }
                TokenResponse::Pending(_) => {
                    let out_of_attempts = self.policy.max_attempts.is_some_and(|max| attempts >= max);
                    let expired = deadline.is_some_and(|d| {
                        Instant::now().checked_add(interval).is_none_or(|next| next >= d)
                    });
                    if out_of_attempts || expired {
                        return Err(Error::PollTimeout { attempts });
                    }

                    debug!(attempts, ?interval, "Authorization pending");
                    prompt.waiting_for_approval(attempts);
                    sleep(interval).await;
                }
            }
        }
    }

    /// Runs the full flow: request a session, show it to the user, poll for tokens.
    ///
    /// # Errors
    ///
    /// See [`Self::request_device_authorization`] and [`Self::poll_for_token`].
    pub async fn authorize<P: DevicePrompt + ?Sized>(
        &self,
        scope: &str,
        prompt: &P,
    ) -> Result<TokenPair> {
        let auth = self.request_device_authorization(scope).await?;
        prompt.verification_required(&auth);
        self.poll_for_token(&auth, prompt).await
    }
}

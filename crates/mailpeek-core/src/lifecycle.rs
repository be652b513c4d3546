//! Token lifecycle management.
//!
//! Picks the cheapest way to a usable access token for a credential record:
//! refresh the stored token pair if there is one, otherwise run the device
//! authorization flow. Either way the resulting record is saved before the
//! caller sees it.

use mailpeek_oauth::{
    DeviceFlow, DevicePrompt, IdentityTransport, PollPolicy, ProviderError, RefreshOutcome,
    TokenPair,
};
use tracing::{info, warn};

use crate::credentials::{CredentialRecord, CredentialStore};
use crate::error::{Error, Result};

/// Which token acquisition path a record takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPath {
    /// No stored access token: run the device flow.
    Authorize,
    /// Stored token pair: use the refresh grant.
    Refresh,
}

impl TokenPath {
    /// Selects the path for `record`.
    #[must_use]
    pub const fn select(record: &CredentialRecord) -> Self {
        if record.tokens().is_some() {
            Self::Refresh
        } else {
            Self::Authorize
        }
    }
}

/// How the run ended up with (or without) a token pair.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenOutcome {
    /// The device flow issued a new pair.
    Authorized(TokenPair),
    /// The refresh grant issued a new pair.
    Refreshed(TokenPair),
    /// The provider rejected the stored refresh token. The stored tokens have
    /// been cleared, so the next run starts a device authorization.
    RefreshFailed(ProviderError),
}

impl TokenOutcome {
    /// Returns the usable token pair.
    ///
    /// # Errors
    ///
    /// Returns `Error::RefreshFailed` if there is none.
    pub fn into_tokens(self) -> Result<TokenPair> {
        match self {
            Self::Authorized(tokens) | Self::Refreshed(tokens) => Ok(tokens),
            Self::RefreshFailed(error) => Err(Error::RefreshFailed(error)),
        }
    }
}

/// Persisted record plus the outcome that produced it.
#[derive(Debug, Clone)]
pub struct Acquisition {
    /// The record as saved to the credential store.
    pub record: CredentialRecord,
    /// How the tokens in `record` were obtained.
    pub outcome: TokenOutcome,
}

/// Drives authorization and refresh against an identity provider and keeps
/// the credential store up to date.
#[derive(Debug)]
pub struct TokenManager<T, S> {
    transport: T,
    store: S,
    policy: PollPolicy,
    reauthorize_on_refresh_failure: bool,
}

impl<T: IdentityTransport, S: CredentialStore> TokenManager<T, S> {
    /// Creates a manager with the default poll policy and no automatic
    /// re-authorization.
    #[must_use]
    pub fn new(transport: T, store: S) -> Self {
        Self {
            transport,
            store,
            policy: PollPolicy::default(),
            reauthorize_on_refresh_failure: false,
        }
    }

    /// Sets the device flow poll policy.
    #[must_use]
    pub const fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// When enabled, a rejected refresh falls through to device authorization
    /// in the same run instead of returning [`TokenOutcome::RefreshFailed`].
    #[must_use]
    pub const fn with_reauthorize_on_refresh_failure(mut self, enabled: bool) -> Self {
        self.reauthorize_on_refresh_failure = enabled;
        self
    }

    /// The credential store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The identity transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Loads the credential record from the store.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` if the record is missing or malformed.
    pub async fn load(&self) -> Result<CredentialRecord> {
        Ok(self.store.load().await?)
    }

    /// Obtains a token pair for `record` and saves the updated record.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if device authorization fails (`AuthRequestFailed`,
    /// `AuthDenied`, `PollTimeout`, `InvalidResponse`) or the identity provider
    /// cannot be reached; the store is left untouched in that case. Returns
    /// `Error::Store` if the updated record cannot be saved.
    pub async fn acquire<P: DevicePrompt + ?Sized>(
        &self,
        record: CredentialRecord,
        prompt: &P,
    ) -> Result<Acquisition> {
        let path = TokenPath::select(&record);
        info!(?path, "Acquiring access token");

        match (path, record.tokens().cloned()) {
            (TokenPath::Refresh, Some(stored)) => self.refresh(record, &stored, prompt).await,
            _ => self.authorize(record, prompt).await,
        }
    }

    async fn authorize<P: DevicePrompt + ?Sized>(
        &self,
        record: CredentialRecord,
        prompt: &P,
    ) -> Result<Acquisition> {
        let tokens = DeviceFlow::new(&self.transport, record.client_id())
            .with_policy(self.policy)
            .authorize(record.scope(), prompt)
            .await?;

        let record = self.persist(record.with_tokens(tokens.clone())).await?;
        Ok(Acquisition {
            record,
            outcome: TokenOutcome::Authorized(tokens),
        })
    }

    async fn refresh<P: DevicePrompt + ?Sized>(
        &self,
        record: CredentialRecord,
        stored: &TokenPair,
        prompt: &P,
    ) -> Result<Acquisition> {
        let outcome = mailpeek_oauth::refresh(
            &self.transport,
            record.client_id(),
            &stored.refresh_token,
            record.scope(),
        )
        .await?;

        match outcome {
            RefreshOutcome::Refreshed(tokens) => {
                let record = self.persist(record.with_tokens(tokens.clone())).await?;
                Ok(Acquisition {
                    record,
                    outcome: TokenOutcome::Refreshed(tokens),
                })
            }
            RefreshOutcome::Rejected(error) if self.reauthorize_on_refresh_failure => {
                warn!(%error, "Refresh rejected, falling back to device authorization");
                self.authorize(record.without_tokens(), prompt).await
            }
            RefreshOutcome::Rejected(error) => {
                warn!(%error, "Refresh rejected, clearing stored tokens");
                let record = self.persist(record.without_tokens()).await?;
                Ok(Acquisition {
                    record,
                    outcome: TokenOutcome::RefreshFailed(error),
                })
            }
        }
    }

    async fn persist(&self, record: CredentialRecord) -> Result<CredentialRecord> {
        self.store.save(&record).await?;
        Ok(record)
    }
}

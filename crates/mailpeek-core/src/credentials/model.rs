//! Credential record model.

use mailpeek_oauth::TokenPair;
use serde::{Deserialize, Serialize};

/// Client identity, mailbox identity and the current token pair.
///
/// The record is a value: token updates consume it and return the updated
/// record. `access_token` and `refresh_token` are stored as one
/// `Option<TokenPair>`, so they are always present or absent together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordFile", into = "RecordFile")]
pub struct CredentialRecord {
    client_id: String,
    tenant_id: String,
    scope: String,
    user_principal_name: String,
    tokens: Option<TokenPair>,
}

impl CredentialRecord {
    /// Creates a record without tokens.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        tenant_id: impl Into<String>,
        scope: impl Into<String>,
        user_principal_name: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            tenant_id: tenant_id.into(),
            scope: scope.into(),
            user_principal_name: user_principal_name.into(),
            tokens: None,
        }
    }

    /// Application (client) ID registered with the identity provider.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Directory tenant the application signs in against.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Space-delimited `OAuth2` scopes.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Mailbox to read.
    #[must_use]
    pub fn user_principal_name(&self) -> &str {
        &self.user_principal_name
    }

    /// Current token pair, if one has been issued.
    #[must_use]
    pub const fn tokens(&self) -> Option<&TokenPair> {
        self.tokens.as_ref()
    }

    /// Current access token, if one has been issued.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access_token.as_str())
    }

    /// Returns the record with `tokens` as its token pair.
    #[must_use]
    pub fn with_tokens(mut self, tokens: TokenPair) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Returns the record with both tokens removed.
    #[must_use]
    pub fn without_tokens(mut self) -> Self {
        self.tokens = None;
        self
    }
}

/// On-disk shape of the record.
#[derive(Serialize, Deserialize)]
struct RecordFile {
    client_id: String,
    tenant_id: String,
    scope: String,
    user_principal_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl TryFrom<RecordFile> for CredentialRecord {
    type Error = String;

    fn try_from(file: RecordFile) -> Result<Self, Self::Error> {
        for (key, value) in [
            ("client_id", &file.client_id),
            ("tenant_id", &file.tenant_id),
            ("scope", &file.scope),
            ("user_principal_name", &file.user_principal_name),
        ] {
            if value.trim().is_empty() {
                return Err(format!("`{key}` must not be empty"));
            }
        }

        let access = file.access_token.filter(|t| !t.is_empty());
        let refresh = file.refresh_token.filter(|t| !t.is_empty());
        let tokens = match (access, refresh) {
            (Some(access), Some(refresh)) => Some(TokenPair::new(access, refresh)),
            (None, None) => None,
            _ => {
                return Err("`access_token` and `refresh_token` must be set together".to_string());
            }
        };

        Ok(Self {
            client_id: file.client_id,
            tenant_id: file.tenant_id,
            scope: file.scope,
            user_principal_name: file.user_principal_name,
            tokens,
        })
    }
}

impl From<CredentialRecord> for RecordFile {
    fn from(record: CredentialRecord) -> Self {
        let (access_token, refresh_token) = match record.tokens {
            Some(pair) => (Some(pair.access_token), Some(pair.refresh_token)),
            None => (None, None),
        };
        Self {
            client_id: record.client_id,
            tenant_id: record.tenant_id,
            scope: record.scope,
            user_principal_name: record.user_principal_name,
            access_token,
            refresh_token,
        }
    }
}

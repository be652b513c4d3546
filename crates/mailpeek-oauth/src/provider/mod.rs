//! `OAuth2` provider endpoint configuration.

use crate::error::{Error, Result};
use url::Url;

/// Microsoft identity platform authority.
const MICROSOFT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Microsoft").
    pub name: String,
    /// Device authorization endpoint.
    pub device_auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        name: impl Into<String>,
        device_auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            device_auth_url: Url::parse(device_auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
        })
    }

    /// Microsoft identity platform endpoints for a tenant.
    ///
    /// `tenant_id` may be a directory GUID, a verified domain, or one of
    /// `common`, `organizations`, `consumers`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tenant is empty or produces an invalid URL.
    pub fn microsoft(tenant_id: &str) -> Result<Self> {
        Self::microsoft_with_authority(MICROSOFT_AUTHORITY, tenant_id)
    }

    /// Microsoft endpoints under a custom authority host (sovereign clouds, tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the tenant is empty or produces an invalid URL.
    pub fn microsoft_with_authority(authority: &str, tenant_id: &str) -> Result<Self> {
        let tenant = tenant_id.trim();
        if tenant.is_empty() || tenant.contains('/') {
            return Err(Error::InvalidConfig(format!(
                "invalid tenant id {tenant_id:?}"
            )));
        }

        let base = authority.trim_end_matches('/');
        Self::new(
            "Microsoft",
            format!("{base}/{tenant}/oauth2/v2.0/devicecode"),
            format!("{base}/{tenant}/oauth2/v2.0/token"),
        )
    }
}

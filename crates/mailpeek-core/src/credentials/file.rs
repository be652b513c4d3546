//! JSON file backend for the credential store.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::{debug, info};

use super::{CredentialRecord, CredentialStore, StoreError, StoreResult};

/// File name looked up in the working directory and the config directory.
const CONFIG_FILE: &str = "config.json";

/// Application directory under the platform config directory.
const APP_DIR: &str = "mailpeek";

/// Credential store backed by a pretty-printed JSON file.
///
/// Saves write a sibling temporary file and rename it over the target, so
/// readers see either the old record or the new one, never a torn write.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store for the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at [`Self::default_path`].
    #[must_use]
    pub fn at_default_location() -> Self {
        Self::new(Self::default_path())
    }

    /// `./config.json` if it exists, otherwise `<config dir>/mailpeek/config.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(CONFIG_FILE)
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_error(&self, source: io::Error) -> StoreError {
        StoreError::StorageWrite {
            path: self.path.clone(),
            source,
        }
    }

    async fn write_atomically(&self, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        let result = async {
            tokio::fs::write(&temp, contents).await?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                tokio::fs::set_permissions(&temp, std::fs::Permissions::from_mode(0o600)).await?;
            }
            tokio::fs::rename(&temp, &self.path).await
        }
        .await;

        if result.is_err() {
            let _ = tokio::fs::remove_file(&temp).await;
        }
        result
    }
}

/// Serializes with 4-space indentation and a trailing newline.
fn render(record: &CredentialRecord) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    record.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}

impl CredentialStore for JsonFileStore {
    async fn load(&self) -> StoreResult<CredentialRecord> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::ConfigMissing {
                    path: self.path.clone(),
                });
            }
            Err(source) => {
                return Err(StoreError::ConfigUnreadable {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let record: CredentialRecord =
            serde_json::from_str(&contents).map_err(|e| StoreError::ConfigMalformed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        debug!(
            path = %self.path.display(),
            has_tokens = record.tokens().is_some(),
            "Loaded credential record"
        );
        Ok(record)
    }

    async fn save(&self, record: &CredentialRecord) -> StoreResult<()> {
        let contents = render(record).map_err(|e| self.write_error(io::Error::other(e)))?;
        self.write_atomically(&contents)
            .await
            .map_err(|e| self.write_error(e))?;

        info!(path = %self.path.display(), "Credential record saved");
        Ok(())
    }
}

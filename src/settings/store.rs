//! Storage backends for the persisted access token.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::SettingsError;

/// Well-known key holding the token inside the settings object.
pub const TOKEN_KEY: &str = "githubToken";

/// Store holding the personal access token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads the stored token; `None` when nothing has been saved.
    async fn load_token(&self) -> Result<Option<String>, SettingsError>;

    /// Persists `token`, replacing any previous value.
    async fn store_token(&self, token: &str) -> Result<(), SettingsError>;
}

/// Settings object as written to disk.
///
/// Unknown keys are preserved so other tools can share the file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedSettings {
    #[serde(rename = "githubToken", default, skip_serializing_if = "Option::is_none")]
    github_token: Option<String>,
    #[serde(flatten)]
    other: serde_json::Map<String, serde_json::Value>,
}

/// Settings persisted as a JSON object in a file.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the settings file exists yet.
    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    async fn read(&self) -> Result<PersistedSettings, SettingsError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(PersistedSettings::default());
            }
            Err(error) => return Err(io_error(&self.path, &error)),
        };

        if contents.trim().is_empty() {
            return Ok(PersistedSettings::default());
        }

        serde_json::from_str(&contents).map_err(|error| SettingsError::Serialisation {
            message: format!("{}: {error}", self.path.display()),
        })
    }
}

fn io_error(path: &Path, error: &io::Error) -> SettingsError {
    SettingsError::Io {
        message: format!("{}: {error}", path.display()),
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn load_token(&self) -> Result<Option<String>, SettingsError> {
        let settings = self.read().await?;
        Ok(settings
            .github_token
            .filter(|token| !token.trim().is_empty()))
    }

    async fn store_token(&self, token: &str) -> Result<(), SettingsError> {
        let mut settings = self.read().await?;
        settings.github_token = Some(token.to_owned());

        let serialised =
            serde_json::to_string_pretty(&settings).map_err(|error| SettingsError::Serialisation {
                message: error.to_string(),
            })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| io_error(parent, &error))?;
        }

        tokio::fs::write(&self.path, serialised)
            .await
            .map_err(|error| io_error(&self.path, &error))
    }
}

/// Settings held in process memory.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    token: Mutex<Option<String>>,
}

impl MemorySettingsStore {
    /// Creates a store pre-populated with `token`.
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_owned())),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load_token(&self) -> Result<Option<String>, SettingsError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn store_token(&self, token: &str) -> Result<(), SettingsError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
        Ok(())
    }
}

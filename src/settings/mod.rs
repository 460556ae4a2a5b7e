//! Persisted access token settings.
//!
//! A single personal access token is validated, stored, and masked for
//! display here. The annotation core only ever reads it back through
//! [`SettingsStore::load_token`]; it never re-validates.

mod store;

pub use store::{JsonFileSettingsStore, MemorySettingsStore, SettingsStore, TOKEN_KEY};

#[cfg(test)]
pub use store::MockSettingsStore;

use thiserror::Error;

/// Prefix of classic personal access tokens.
const CLASSIC_TOKEN_PREFIX: &str = "ghp_";
/// Prefix of fine-grained personal access tokens.
const FINE_GRAINED_TOKEN_PREFIX: &str = "github_pat_";
/// Length from which unprefixed (legacy) tokens are accepted.
const LEGACY_TOKEN_MIN_CHARS: usize = 40;
/// Tokens at most this long are displayed without masking.
const MASK_VISIBLE_THRESHOLD: usize = 8;
/// Characters kept visible at each end of a masked token.
const MASK_EDGE_CHARS: usize = 4;

/// Errors raised while validating or persisting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The token was blank after trimming.
    #[error("please enter a token")]
    Empty,

    /// The token does not look like a GitHub personal access token.
    #[error("invalid token format; expected a GitHub personal access token")]
    InvalidFormat,

    /// Reading or writing the settings file failed.
    #[error("settings I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// The settings file did not contain a JSON object.
    #[error("settings file is not valid JSON: {message}")]
    Serialisation {
        /// Error detail from `serde_json`.
        message: String,
    },
}

/// Why the host lifecycle hook fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
    /// First installation.
    Install,
    /// Upgrade of an existing installation.
    Update,
}

/// Whether the settings screen should be opened for a lifecycle event.
///
/// Only a fresh install prompts for a token; updates stay silent.
#[must_use]
pub const fn should_open_settings(reason: InstallReason) -> bool {
    matches!(reason, InstallReason::Install)
}

/// Trims `raw` and checks it looks like a personal access token.
///
/// Accepted: tokens starting with `ghp_` or `github_pat_`, or any token of at
/// least 40 characters.
///
/// # Errors
///
/// Returns [`SettingsError::Empty`] for blank input and
/// [`SettingsError::InvalidFormat`] otherwise.
pub fn validate_token(raw: &str) -> Result<&str, SettingsError> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(SettingsError::Empty);
    }

    let prefixed =
        token.starts_with(CLASSIC_TOKEN_PREFIX) || token.starts_with(FINE_GRAINED_TOKEN_PREFIX);
    if !prefixed && token.chars().count() < LEGACY_TOKEN_MIN_CHARS {
        return Err(SettingsError::InvalidFormat);
    }
    Ok(token)
}

/// Masks a token for display as `abcd...wxyz`.
///
/// Tokens of eight characters or fewer are returned unchanged.
#[must_use]
pub fn mask_token(token: &str) -> String {
    let length = token.chars().count();
    if length <= MASK_VISIBLE_THRESHOLD {
        return token.to_owned();
    }

    let head: String = token.chars().take(MASK_EDGE_CHARS).collect();
    let tail: String = token.chars().skip(length - MASK_EDGE_CHARS).collect();
    format!("{head}...{tail}")
}

/// Validates `raw` and persists the trimmed token.
///
/// Returns the masked form of the stored token.
///
/// # Errors
///
/// Returns validation errors from [`validate_token`] or the store's I/O error.
pub async fn save_token(store: &dyn SettingsStore, raw: &str) -> Result<String, SettingsError> {
    let token = validate_token(raw)?;
    store.store_token(token).await?;
    tracing::info!("personal access token saved");
    Ok(mask_token(token))
}

/// Loads the stored token in masked form, if one exists.
///
/// # Errors
///
/// Returns the store's error when the settings cannot be read.
pub async fn load_masked_token(store: &dyn SettingsStore) -> Result<Option<String>, SettingsError> {
    let token = store.load_token().await?;
    Ok(token.as_deref().map(mask_token))
}

#[cfg(test)]
mod tests;

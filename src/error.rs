//! Errors surfaced by the `reviewlens` command-line entry point.

use thiserror::Error;

use crate::config::ConfigError;
use crate::github::{FetchError, LocationError};
use crate::page::DocumentError;
use crate::settings::SettingsError;

/// Top-level failure of a CLI run.
#[derive(Debug, Error)]
pub enum AppError {
    /// ortho-config could not parse arguments or read configuration files.
    #[error("configuration error: {message}")]
    Load {
        /// Error detail from ortho-config.
        message: String,
    },

    /// Configuration values could not be turned into runtime options.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The token could not be validated, stored, or read.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The page URL does not identify a pull request list view.
    #[error(transparent)]
    Location(#[from] LocationError),

    /// The API client could not be constructed.
    #[error("failed to set up GitHub client: {0}")]
    Gateway(#[from] FetchError),

    /// Building the synthetic list document failed.
    #[error("failed to build list view: {0}")]
    Page(#[from] DocumentError),

    /// Writing output failed.
    #[error("output error: {message}")]
    Io {
        /// Error detail from the underlying writer.
        message: String,
    },
}

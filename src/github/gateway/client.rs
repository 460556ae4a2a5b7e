//! Octocrab client construction helpers for gateway implementations.

use http::Uri;
use octocrab::Octocrab;

use crate::github::error::FetchError;

use super::error_mapping::map_octocrab_error;

/// Builds an unauthenticated Octocrab client for the given API base URL.
///
/// Authentication travels in the per-request headers produced by the
/// credential provider, so the client itself carries no token.
///
/// # Errors
///
/// Returns `FetchError::InvalidUrl` when the base URI cannot be parsed or
/// `FetchError::Configuration` when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(api_base: &str) -> Result<Octocrab, FetchError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| FetchError::InvalidUrl(error.to_string()))?;

    Octocrab::builder()
        .base_uri(base_uri)
        .map_err(|error| FetchError::Configuration {
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}

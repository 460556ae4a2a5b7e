//! Request headers for the GitHub REST API.
//!
//! [`CredentialProvider::headers`] never fails: a settings read error or an
//! unusable token is logged and the request proceeds unauthenticated.

use std::sync::Arc;

use http::HeaderMap;
use http::header::{ACCEPT, AUTHORIZATION, HeaderName, HeaderValue};

use crate::settings::SettingsStore;

/// Media type pinned on every request.
pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
/// Dated REST API version pinned on every request.
pub const GITHUB_API_VERSION: &str = "2022-11-28";
/// Header carrying [`GITHUB_API_VERSION`].
pub const API_VERSION_HEADER: &str = "x-github-api-version";

/// Builds API headers from the persisted token.
#[derive(Clone)]
pub struct CredentialProvider {
    store: Arc<dyn SettingsStore>,
}

impl CredentialProvider {
    /// Creates a provider reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Returns the Accept and version headers, plus a bearer authorisation
    /// header when a token is stored.
    pub async fn headers(&self) -> HeaderMap {
        let mut headers = base_headers();

        let token = match self.store.load_token().await {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!("failed to read token from settings: {error}");
                None
            }
        };

        if let Some(token) = token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(error) => {
                    tracing::warn!("stored token is not a valid header value: {error}");
                }
            }
        }

        headers
    }
}

fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
    headers.insert(
        HeaderName::from_static(API_VERSION_HEADER),
        HeaderValue::from_static(GITHUB_API_VERSION),
    );
    headers
}

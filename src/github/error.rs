//! Error types exposed by the GitHub reviewer gateway.

use thiserror::Error;

/// Number of body characters kept in [`FetchError::Api`] for diagnostics.
pub const BODY_EXCERPT_CHARS: usize = 100;

/// Errors surfaced while loading reviewer data from GitHub.
///
/// None of these escape the reviewer fetcher: it converts every failure into
/// a tagged outcome whose message is the `Display` text below.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// GitHub answered the pull request request with a non-success status.
    #[error("GitHub API error {status}: {excerpt}")]
    Api {
        /// Numeric HTTP status code.
        status: u16,
        /// Leading characters of the response body.
        excerpt: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// The payload did not have the shape the reviewer logic relies on.
    #[error("unexpected GitHub payload: {message}")]
    MalformedPayload {
        /// What was missing or failed to decode.
        message: String,
    },

    /// A request or base URL could not be parsed.
    #[error("GitHub URL is invalid: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the construction failure.
        message: String,
    },
}

impl FetchError {
    /// Builds an [`FetchError::Api`] keeping only the leading part of `body`.
    #[must_use]
    pub fn api(status: u16, body: &str) -> Self {
        Self::Api {
            status,
            excerpt: body.chars().take(BODY_EXCERPT_CHARS).collect(),
        }
    }
}

/// Errors raised while deriving repository coordinates from page locations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocationError {
    /// The location could not be parsed as a URL.
    #[error("page URL is invalid: {0}")]
    InvalidUrl(String),

    /// The path is not `/owner/repo/pulls...` on the configured host.
    #[error("not a pull request list view: {location}")]
    NotAListView {
        /// The rejected location.
        location: String,
    },

    /// A repository coordinate segment was blank.
    #[error("repository owner and name must be non-empty")]
    MissingPathSegments,

    /// The pull request number is not a positive decimal integer.
    #[error("pull request number must be a positive integer: {value}")]
    InvalidPullRequestNumber {
        /// The rejected input.
        value: String,
    },
}

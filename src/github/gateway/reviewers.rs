//! Octocrab implementation of the reviewer gateway.

use async_trait::async_trait;
use http::{HeaderMap, StatusCode, Uri};
use octocrab::Octocrab;

use crate::credentials::API_VERSION_HEADER;
use crate::github::error::FetchError;
use crate::github::locator::PullRequestTarget;
use crate::github::models::{
    ApiPullRequestDetail, PullRequestReviewState, SubmittedReview, decode_reviews,
};

use super::ReviewerGateway;
use super::client::build_octocrab_client;
use super::error_mapping::{map_decode_error, map_octocrab_error};

/// Octocrab-backed reviewer gateway.
///
/// Requests go through Octocrab's raw GET so that the caller's headers are
/// sent and non-success statuses come back as data instead of errors. The
/// client pins the REST API version itself, so the caller's copy of that
/// header is dropped rather than appended a second time.
pub struct OctocrabReviewerGateway {
    client: Octocrab,
}

impl OctocrabReviewerGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds a gateway talking to `api_base`, e.g. `https://api.github.com`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` when the base URI cannot be parsed or
    /// `FetchError::Configuration` when Octocrab fails to construct a client.
    pub fn for_api_base(api_base: &str) -> Result<Self, FetchError> {
        build_octocrab_client(api_base).map(Self::new)
    }

    async fn get_raw(
        &self,
        operation: &str,
        path: String,
        headers: &HeaderMap,
    ) -> Result<(StatusCode, String), FetchError> {
        let uri: Uri = path
            .parse::<Uri>()
            .map_err(|error| FetchError::InvalidUrl(error.to_string()))?;

        let response = self
            .client
            ._get_with_headers(uri, Some(request_headers(headers)))
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        let status = response.status();
        let body = self
            .client
            .body_to_string(response)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;
        Ok((status, body))
    }
}

fn request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut request = headers.clone();
    let _pinned = request.remove(API_VERSION_HEADER);
    request
}

#[async_trait]
impl ReviewerGateway for OctocrabReviewerGateway {
    async fn pull_request(
        &self,
        target: &PullRequestTarget,
        headers: &HeaderMap,
    ) -> Result<PullRequestReviewState, FetchError> {
        let (status, body) = self
            .get_raw("pull request", target.pull_request_path(), headers)
            .await?;

        if !status.is_success() {
            tracing::warn!(
                pull_request = %target.number(),
                status = status.as_u16(),
                "pull request request failed: {body}"
            );
            return Err(FetchError::api(status.as_u16(), &body));
        }

        serde_json::from_str::<ApiPullRequestDetail>(&body)
            .map(PullRequestReviewState::from)
            .map_err(|error| map_decode_error("pull request", &error))
    }

    async fn reviews(
        &self,
        target: &PullRequestTarget,
        headers: &HeaderMap,
    ) -> Result<Option<Vec<SubmittedReview>>, FetchError> {
        let (status, body) = self
            .get_raw("reviews", target.reviews_path(), headers)
            .await?;

        if !status.is_success() {
            tracing::debug!(
                pull_request = %target.number(),
                status = status.as_u16(),
                "reviews request failed; ignoring submitted reviews"
            );
            return Ok(None);
        }

        decode_reviews(&body)
            .map(Some)
            .map_err(|error| map_decode_error("reviews", &error))
    }
}

//! Gateways for loading reviewer data through Octocrab.
//!
//! The trait seam lets the reviewer fetcher run against mocks in tests while
//! the Octocrab implementation issues real HTTP requests with caller-supplied
//! headers.

mod client;
mod error_mapping;
mod reviewers;
#[cfg(feature = "test-support")]
pub mod test_support;

pub use reviewers::OctocrabReviewerGateway;

use async_trait::async_trait;
use http::HeaderMap;

use crate::github::error::FetchError;
use crate::github::locator::PullRequestTarget;
use crate::github::models::{PullRequestReviewState, SubmittedReview};

/// Gateway that can load the reviewer-related state of a pull request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewerGateway: Send + Sync {
    /// Fetch the pull request detail.
    ///
    /// A non-success status is an error carrying the status and a body
    /// excerpt.
    async fn pull_request(
        &self,
        target: &PullRequestTarget,
        headers: &HeaderMap,
    ) -> Result<PullRequestReviewState, FetchError>;

    /// Fetch the first page of submitted reviews.
    ///
    /// Returns `Ok(None)` when GitHub answers with a non-success status; only
    /// transport and decode failures are errors.
    async fn reviews(
        &self,
        target: &PullRequestTarget,
        headers: &HeaderMap,
    ) -> Result<Option<Vec<SubmittedReview>>, FetchError>;
}

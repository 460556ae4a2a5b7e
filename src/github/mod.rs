//! GitHub coordinates, payload models, and the reviewer gateway.
//!
//! This module parses repository coordinates out of list-view locations,
//! decodes the pull request detail and review payloads, and wraps Octocrab
//! behind the [`ReviewerGateway`] trait. Errors are mapped into
//! [`FetchError`] so callers never see Octocrab internals.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;

pub use error::{FetchError, LocationError};
pub use gateway::{OctocrabReviewerGateway, ReviewerGateway};
pub use locator::{
    PullRequestNumber, PullRequestTarget, RepoContext, RepositoryName, RepositoryOwner,
};
pub use models::{PullRequestReviewState, SubmittedReview};

#[cfg(test)]
pub use gateway::MockReviewerGateway;

//! Scripted reviewer gateway for tests that need to control timing.
//!
//! Unlike the mockall mocks, [`ScriptedGateway`] can hold a response open
//! until the test releases it, which is what the staleness and
//! in-flight deduplication tests rely on.
//!
//! # Examples
//!
//! ```
//! use reviewlens::github::gateway::test_support::ScriptedGateway;
//! use reviewlens::github::models::{PullRequestReviewState, SubmittedReview};
//!
//! let gateway = ScriptedGateway::new();
//! gateway.respond(
//!     7,
//!     PullRequestReviewState::default(),
//!     vec![SubmittedReview::new("bob", "APPROVED")],
//! );
//! assert_eq!(gateway.detail_calls(7), 0);
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use http::HeaderMap;
use tokio::sync::watch;

use super::ReviewerGateway;
use crate::github::error::FetchError;
use crate::github::locator::PullRequestTarget;
use crate::github::models::{PullRequestReviewState, SubmittedReview};

/// Canned answers for one pull request.
#[derive(Debug, Clone)]
pub struct Script {
    /// Result of the detail request.
    pub detail: Result<PullRequestReviewState, FetchError>,
    /// Result of the reviews request.
    pub reviews: Result<Option<Vec<SubmittedReview>>, FetchError>,
}

/// Releases a response held by [`ScriptedGateway::hold`].
#[derive(Debug, Clone)]
pub struct Gate {
    sender: watch::Sender<bool>,
}

impl Gate {
    /// Lets every waiting and future request for the pull request complete.
    pub fn release(&self) {
        self.sender.send_replace(true);
    }
}

#[derive(Debug, Default)]
struct ScriptedState {
    scripts: HashMap<u64, Script>,
    gates: HashMap<u64, watch::Receiver<bool>>,
    detail_calls: HashMap<u64, usize>,
    review_calls: HashMap<u64, usize>,
    last_headers: Option<HeaderMap>,
}

/// In-memory gateway answering from per-pull-request scripts.
///
/// Unscripted pull requests answer the detail request with a 404.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    state: Mutex<ScriptedState>,
}

impl ScriptedGateway {
    /// Creates a gateway with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, action: impl FnOnce(&mut ScriptedState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        action(&mut guard)
    }

    /// Installs a script for `number`, replacing any previous one.
    pub fn script(&self, number: u64, script: Script) {
        self.with_state(|state| {
            state.scripts.insert(number, script);
        });
    }

    /// Scripts a successful detail and reviews response.
    pub fn respond(
        &self,
        number: u64,
        detail: PullRequestReviewState,
        reviews: Vec<SubmittedReview>,
    ) {
        self.script(
            number,
            Script {
                detail: Ok(detail),
                reviews: Ok(Some(reviews)),
            },
        );
    }

    /// Scripts a failing detail response.
    pub fn fail(&self, number: u64, error: FetchError) {
        self.script(
            number,
            Script {
                detail: Err(error),
                reviews: Ok(None),
            },
        );
    }

    /// Holds every request for `number` until the returned gate is released.
    #[must_use]
    pub fn hold(&self, number: u64) -> Gate {
        let (sender, receiver) = watch::channel(false);
        self.with_state(|state| {
            state.gates.insert(number, receiver);
        });
        Gate { sender }
    }

    /// Number of detail requests issued for `number`.
    #[must_use]
    pub fn detail_calls(&self, number: u64) -> usize {
        self.with_state(|state| state.detail_calls.get(&number).copied().unwrap_or(0))
    }

    /// Number of reviews requests issued for `number`.
    #[must_use]
    pub fn review_calls(&self, number: u64) -> usize {
        self.with_state(|state| state.review_calls.get(&number).copied().unwrap_or(0))
    }

    /// Detail requests issued across all pull requests.
    #[must_use]
    pub fn total_detail_calls(&self) -> usize {
        self.with_state(|state| state.detail_calls.values().sum())
    }

    /// Headers sent with the most recent request.
    #[must_use]
    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.with_state(|state| state.last_headers.clone())
    }

    async fn wait_for_gate(&self, number: u64) {
        let gate = self.with_state(|state| state.gates.get(&number).cloned());
        if let Some(mut receiver) = gate {
            // A dropped gate counts as released.
            let _released = receiver.wait_for(|open| *open).await;
        }
    }

    fn script_for(&self, number: u64) -> Option<Script> {
        self.with_state(|state| state.scripts.get(&number).cloned())
    }
}

#[async_trait]
impl ReviewerGateway for ScriptedGateway {
    async fn pull_request(
        &self,
        target: &PullRequestTarget,
        headers: &HeaderMap,
    ) -> Result<PullRequestReviewState, FetchError> {
        let number = target.number().get();
        self.with_state(|state| {
            *state.detail_calls.entry(number).or_insert(0) += 1;
            state.last_headers = Some(headers.clone());
        });
        self.wait_for_gate(number).await;

        self.script_for(number).map_or_else(
            || Err(FetchError::api(404, r#"{"message":"Not Found"}"#)),
            |script| script.detail,
        )
    }

    async fn reviews(
        &self,
        target: &PullRequestTarget,
        _headers: &HeaderMap,
    ) -> Result<Option<Vec<SubmittedReview>>, FetchError> {
        let number = target.number().get();
        self.with_state(|state| {
            *state.review_calls.entry(number).or_insert(0) += 1;
        });
        self.wait_for_gate(number).await;

        self.script_for(number)
            .map_or(Ok(None), |script| script.reviews)
    }
}

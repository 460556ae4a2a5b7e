//! Scenario state for row annotation BDD tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use reviewlens::Extension;
use reviewlens::github::gateway::test_support::{Script, ScriptedGateway};
use reviewlens::github::{FetchError, PullRequestReviewState, SubmittedReview};
use reviewlens::page::{NodeId, Page};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use tokio::runtime::Runtime;

/// Shared runtime wrapper that can be stored in an `rstest-bdd` Slot.
///
/// The runtime outlives individual steps so watcher and completion tasks
/// keep running between them.
#[derive(Clone)]
pub struct SharedRuntime(Rc<RefCell<Runtime>>);

impl SharedRuntime {
    pub fn new(runtime: Runtime) -> Self {
        Self(Rc::new(RefCell::new(runtime)))
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.borrow().block_on(future)
    }
}

/// Canned API answers collected by `Given` steps, keyed by PR number.
#[derive(Default)]
pub struct ScriptBook {
    scripts: HashMap<u64, Script>,
}

impl ScriptBook {
    fn entry(&mut self, number: u64) -> &mut Script {
        self.scripts.entry(number).or_insert_with(|| Script {
            detail: Ok(PullRequestReviewState {
                requested_reviewers: Vec::new(),
                requested_teams: Vec::new(),
                author: Some("carol".to_owned()),
            }),
            reviews: Ok(Some(Vec::new())),
        })
    }

    /// Adds `login` to the requested individuals of `number`.
    pub fn request_reviewer(&mut self, number: u64, login: &str) {
        if let Ok(detail) = &mut self.entry(number).detail {
            detail.requested_reviewers.push(login.to_owned());
        }
    }

    /// Adds `slug` to the requested teams of `number`.
    pub fn request_team(&mut self, number: u64, slug: &str) {
        if let Ok(detail) = &mut self.entry(number).detail {
            detail.requested_teams.push(slug.to_owned());
        }
    }

    /// Records a submitted review on `number`.
    pub fn submit_review(&mut self, number: u64, login: &str, state: &str) {
        if let Ok(Some(reviews)) = &mut self.entry(number).reviews {
            reviews.push(SubmittedReview::new(login, state));
        }
    }

    /// Makes the detail request for `number` fail with `status`.
    pub fn fail(&mut self, number: u64, status: u16) {
        self.entry(number).detail = Err(FetchError::api(
            status,
            r#"{"message":"Not Found"}"#,
        ));
    }

    /// Installs every collected script on `gateway`.
    pub fn install(&self, gateway: &ScriptedGateway) {
        for (number, script) in &self.scripts {
            gateway.script(*number, script.clone());
        }
    }
}

/// State shared across steps in a row annotation scenario.
#[derive(ScenarioState, Default)]
pub struct AnnotationState {
    /// Runtime driving watcher and lookup tasks.
    pub runtime: Slot<SharedRuntime>,
    /// Page under test.
    pub page: Slot<Page>,
    /// Container the rows live in.
    pub container: Slot<NodeId>,
    /// Rows by pull request number.
    pub rows: Slot<Vec<(u64, NodeId)>>,
    /// Scripts collected before the gateway is used.
    pub scripts: Slot<ScriptBook>,
    /// Gateway answering lookups.
    pub gateway: Slot<Arc<ScriptedGateway>>,
    /// Extension annotating the page.
    pub extension: Slot<Extension>,
}

impl AnnotationState {
    /// Returns the runtime, creating it on first use.
    #[expect(clippy::expect_used, reason = "BDD test helper; panics are acceptable")]
    pub fn runtime(&self) -> SharedRuntime {
        if self.runtime.with_ref(|_| ()).is_none() {
            self.runtime.set(SharedRuntime::new(
                Runtime::new().expect("runtime should start"),
            ));
        }
        self.runtime.get().expect("runtime initialised")
    }

    /// Applies `action` to the script book, creating it on first use.
    pub fn with_scripts(&self, action: impl FnOnce(&mut ScriptBook)) {
        if self.scripts.with_ref(|_| ()).is_none() {
            self.scripts.set(ScriptBook::default());
        }
        let _applied = self.scripts.with_mut(action);
    }

    /// Row handle for pull request `number`.
    #[expect(clippy::expect_used, reason = "BDD test helper; panics are acceptable")]
    pub fn row(&self, number: u64) -> NodeId {
        self.rows
            .with_ref(|rows| {
                rows.iter()
                    .find_map(|(candidate, row)| (*candidate == number).then_some(*row))
            })
            .flatten()
            .expect("row for pull request should exist")
    }
}

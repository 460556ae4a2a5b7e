//! Shared test utilities.

use std::sync::Arc;
use std::time::Duration;

use reviewlens::github::{PullRequestReviewState, ReviewerGateway};
use reviewlens::page::list_view;
use reviewlens::page::{NodeId, Page};
use reviewlens::settings::MemorySettingsStore;
use reviewlens::{AnnotatorOptions, CredentialProvider, Extension};

/// List view location used across integration tests.
pub const LIST_URL: &str = "https://github.com/octo/widgets/pulls";

/// Builds a list page at `location` holding one row per number.
///
/// # Panics
///
/// Panics if the synthetic rows cannot be appended.
pub fn list_page(location: &str, numbers: &[u64]) -> (Page, Vec<NodeId>) {
    let page = Page::new(location);
    let rows = {
        let mut document = page.document();
        let container = list_view::list_container(&mut document)
            .unwrap_or_else(|error| panic!("failed to build container: {error}"));
        list_view::append_rows(&mut document, container, "octo/widgets", numbers)
            .unwrap_or_else(|error| panic!("failed to build rows: {error}"))
    };
    (page, rows)
}

/// Credentials backed by an in-memory store, optionally holding `token`.
pub fn credentials(token: Option<&str>) -> CredentialProvider {
    let store = token.map_or_else(MemorySettingsStore::default, MemorySettingsStore::with_token);
    CredentialProvider::new(Arc::new(store))
}

/// Wires an extension for `page` with default options and no token.
pub fn extension_for(page: &Page, gateway: Arc<dyn ReviewerGateway>) -> Extension {
    Extension::new(
        page.clone(),
        gateway,
        credentials(None),
        AnnotatorOptions::default(),
    )
}

/// Detail response with the given requested reviewers and teams, authored by
/// `carol`.
pub fn detail(reviewers: &[&str], teams: &[&str]) -> PullRequestReviewState {
    PullRequestReviewState {
        requested_reviewers: reviewers.iter().map(|name| (*name).to_owned()).collect(),
        requested_teams: teams.iter().map(|slug| (*slug).to_owned()).collect(),
        author: Some("carol".to_owned()),
    }
}

/// Current indicator text of `row`.
pub fn indicator(page: &Page, row: NodeId) -> Option<String> {
    list_view::indicator_text(&page.document(), row)
}

/// Polls until `row` shows `expected` or five seconds pass.
///
/// # Panics
///
/// Panics when the indicator never reaches `expected`.
pub async fn wait_for_indicator(page: &Page, row: NodeId, expected: &str) {
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        while indicator(page, row).as_deref() != Some(expected) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(
        reached.is_ok(),
        "row never showed {expected:?}; last saw {:?}",
        indicator(page, row)
    );
}

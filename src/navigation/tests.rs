//! Unit tests for session lifecycle and navigation monitoring.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rstest::{fixture, rstest};

use super::{Extension, InitOutcome, MIN_POLL_INTERVAL, MonitorTiming, NavigationMonitor};
use crate::annotate::AnnotatorOptions;
use crate::credentials::CredentialProvider;
use crate::github::{FetchError, MockReviewerGateway, PullRequestReviewState};
use crate::page::list_view::{self, RowShape};
use crate::page::{NodeId, Page};
use crate::settings::MemorySettingsStore;

const LIST: &str = "https://github.com/octo/widgets/pulls";
const FILTERED_LIST: &str = "https://github.com/octo/widgets/pulls?q=is%3Aclosed";
const ISSUE: &str = "https://github.com/octo/widgets/issues/4";

fn reviewers_of(login: &str) -> PullRequestReviewState {
    PullRequestReviewState {
        requested_reviewers: vec![login.to_owned()],
        requested_teams: Vec::new(),
        author: Some("carol".to_owned()),
    }
}

#[fixture]
fn alice_gateway() -> MockReviewerGateway {
    let mut gateway = MockReviewerGateway::new();
    gateway
        .expect_pull_request()
        .returning(|_, _| Ok(reviewers_of("alice")));
    gateway.expect_reviews().returning(|_, _| Ok(None));
    gateway
}

fn extension_with(
    gateway: MockReviewerGateway,
    location: &str,
    options: AnnotatorOptions,
) -> Extension {
    let credentials = CredentialProvider::new(Arc::new(MemorySettingsStore::default()));
    Extension::new(Page::new(location), Arc::new(gateway), credentials, options)
}

fn add_rows(page: &Page, numbers: &[u64]) -> Vec<NodeId> {
    let mut document = page.document();
    let root = document.root();
    numbers
        .iter()
        .map(|number| {
            let row = list_view::pull_request_row(
                &mut document,
                "octo/widgets",
                *number,
                RowShape::full(),
            )
            .expect("row should build");
            document.append_child(root, row).expect("append should succeed");
            row
        })
        .collect()
}

fn text(page: &Page, row: NodeId) -> Option<String> {
    list_view::indicator_text(&page.document(), row)
}

#[rstest]
#[tokio::test]
async fn list_views_start_an_active_session(alice_gateway: MockReviewerGateway) {
    let extension = extension_with(alice_gateway, LIST, AnnotatorOptions::default());
    let rows = add_rows(extension.page(), &[1, 2]);

    let outcome = extension.initialize();
    extension.settle().await;

    assert_eq!(outcome, InitOutcome::Active { rows: 2 });
    assert!(extension.is_watching());
    for row in rows {
        assert_eq!(text(extension.page(), row).as_deref(), Some("• Reviewed by alice"));
    }
}

#[rstest]
#[case::issue_page(ISSUE)]
#[case::other_host("https://example.com/octo/widgets/pulls")]
#[case::repository_root("https://github.com/octo/widgets")]
#[tokio::test]
async fn other_locations_are_inert(#[case] location: &str) {
    let extension = extension_with(
        MockReviewerGateway::new(),
        location,
        AnnotatorOptions::default(),
    );
    let rows = add_rows(extension.page(), &[1]);

    let outcome = extension.initialize();

    assert_eq!(outcome, InitOutcome::Inert);
    assert!(!extension.is_watching());
    assert!(extension.session().is_none());
    let row = rows.first().copied().expect("one row");
    assert_eq!(text(extension.page(), row), None);
}

#[rstest]
#[tokio::test]
async fn leaving_the_list_disconnects_the_watcher(alice_gateway: MockReviewerGateway) {
    let extension = extension_with(alice_gateway, LIST, AnnotatorOptions::default());
    let _outcome = extension.initialize();
    assert!(extension.is_watching());

    extension.page().push_state(ISSUE);
    let outcome = extension.initialize();
    let rows = add_rows(extension.page(), &[9]);
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    assert_eq!(outcome, InitOutcome::Inert);
    assert!(!extension.is_watching());
    let row = rows.first().copied().expect("one row");
    assert_eq!(text(extension.page(), row), None);
}

#[rstest]
#[tokio::test]
async fn navigation_discards_cached_errors() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut gateway = MockReviewerGateway::new();
    let detail_calls = Arc::clone(&calls);
    gateway.expect_pull_request().returning(move |_, _| {
        if detail_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(FetchError::Network {
                message: "offline".to_owned(),
            })
        } else {
            Ok(reviewers_of("alice"))
        }
    });
    gateway.expect_reviews().returning(|_, _| Ok(None));
    let extension = extension_with(gateway, LIST, AnnotatorOptions::default());
    let rows = add_rows(extension.page(), &[1]);
    let row = rows.first().copied().expect("one row");

    let _outcome = extension.initialize();
    extension.settle().await;
    assert_eq!(text(extension.page(), row).as_deref(), Some("• Reviewed by N/A"));

    extension.page().push_state(FILTERED_LIST);
    let _outcome = extension.initialize();
    extension.settle().await;

    assert_eq!(text(extension.page(), row).as_deref(), Some("• Reviewed by alice"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test]
async fn clearing_indicators_removes_stale_results(alice_gateway: MockReviewerGateway) {
    let options = AnnotatorOptions {
        clear_indicators_on_navigation: true,
        ..AnnotatorOptions::default()
    };
    let extension = extension_with(alice_gateway, LIST, options);
    let rows = add_rows(extension.page(), &[1]);
    let row = rows.first().copied().expect("one row");
    let indicator_selector = AnnotatorOptions::default().selectors.indicator;
    let _outcome = extension.initialize();
    extension.settle().await;
    let previous = extension
        .page()
        .document()
        .query_selector(row, &indicator_selector)
        .expect("indicator should exist");

    extension.page().push_state(ISSUE);
    let _outcome = extension.initialize();
    extension.page().push_state(LIST);
    let outcome = extension.initialize();
    extension.settle().await;

    assert_eq!(outcome, InitOutcome::Active { rows: 1 });
    let document = extension.page().document();
    assert!(!document.contains(previous), "old indicator should be removed");
    assert_eq!(document.query_selector_all(row, &indicator_selector).len(), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn monitor_reinitialises_after_the_settle_delay(alice_gateway: MockReviewerGateway) {
    let extension = extension_with(alice_gateway, LIST, AnnotatorOptions::default());
    let mut monitor = NavigationMonitor::new(extension.clone(), MonitorTiming::default());

    assert!(!monitor.check().await, "unchanged location must not re-initialise");
    assert!(extension.session().is_none());

    extension.page().push_state(FILTERED_LIST);
    let started = tokio::time::Instant::now();
    assert!(monitor.check().await);

    assert!(started.elapsed() >= MonitorTiming::default().settle_delay);
    assert!(extension.session().is_some());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn polling_notices_silent_location_changes(alice_gateway: MockReviewerGateway) {
    let extension = extension_with(alice_gateway, LIST, AnnotatorOptions::default());
    let handle = extension.start(MonitorTiming::default());
    assert!(extension.is_watching());

    extension.page().push_state(ISSUE);
    tokio::time::sleep(Duration::from_millis(1600)).await;

    assert!(!extension.is_watching());
    assert!(extension.session().is_none());
    handle.shutdown();
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn history_signals_trigger_an_early_check(alice_gateway: MockReviewerGateway) {
    let timing = MonitorTiming {
        poll_interval: Duration::from_secs(3600),
        settle_delay: Duration::from_millis(500),
    };
    let extension = extension_with(alice_gateway, ISSUE, AnnotatorOptions::default());
    let handle = extension.start(timing);
    assert!(extension.session().is_none());

    extension.page().pop_state(LIST);
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(extension.session().is_some());
    assert!(extension.is_watching());
    handle.shutdown();
}

#[rstest]
fn zero_poll_interval_is_raised_to_the_minimum() {
    let timing = MonitorTiming {
        poll_interval: Duration::ZERO,
        ..MonitorTiming::default()
    };

    assert_eq!(timing.effective_poll_interval(), MIN_POLL_INTERVAL);
    assert_eq!(
        MonitorTiming::default().effective_poll_interval(),
        Duration::from_millis(1000)
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn monitor_keeps_polling_with_a_zero_interval(alice_gateway: MockReviewerGateway) {
    let timing = MonitorTiming {
        poll_interval: Duration::ZERO,
        settle_delay: Duration::from_millis(20),
    };
    let extension = extension_with(alice_gateway, LIST, AnnotatorOptions::default());
    let handle = extension.start(timing);
    assert!(extension.session().is_some());

    extension.page().push_state(ISSUE);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(extension.session().is_none(), "silent change should be noticed");
    handle.shutdown();
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn navigating_waits_for_the_new_session(alice_gateway: MockReviewerGateway) {
    let extension = extension_with(alice_gateway, ISSUE, AnnotatorOptions::default());
    let rows = add_rows(extension.page(), &[5]);
    let row = rows.first().copied().expect("one row");
    let handle = extension.start(MonitorTiming::default());
    assert_eq!(text(extension.page(), row), None);

    assert!(handle.navigate(LIST).await, "list view should re-initialise");
    assert_eq!(text(extension.page(), row).as_deref(), Some("• Reviewed by alice"));

    assert!(
        !handle.navigate(LIST).await,
        "an unchanged location should not re-initialise"
    );
    handle.shutdown();
}

#[rstest]
#[tokio::test]
async fn shutdown_stops_watching(alice_gateway: MockReviewerGateway) {
    let extension = extension_with(alice_gateway, LIST, AnnotatorOptions::default());
    let handle = extension.start(MonitorTiming::default());
    assert!(handle.extension().is_watching());

    handle.shutdown();

    assert!(!extension.is_watching());
    assert!(extension.session().is_none());
}

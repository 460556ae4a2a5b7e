//! Integration tests for in-flight lookup sharing and stale completions.

mod support;

use std::sync::Arc;

use reviewlens::github::SubmittedReview;
use reviewlens::github::gateway::test_support::ScriptedGateway;
use reviewlens::InitOutcome;
use rstest::{fixture, rstest};
use support::{LIST_URL, detail, extension_for, indicator, list_page, wait_for_indicator};

#[fixture]
fn gateway() -> Arc<ScriptedGateway> {
    Arc::new(ScriptedGateway::new())
}

#[rstest]
#[tokio::test]
async fn duplicate_rows_share_one_lookup(gateway: Arc<ScriptedGateway>) {
    gateway.respond(
        7,
        detail(&["alice"], &[]),
        vec![SubmittedReview::new("bob", "APPROVED")],
    );
    let gate = gateway.hold(7);
    let (page, rows) = list_page(LIST_URL, &[7, 7]);
    let extension = extension_for(&page, Arc::<ScriptedGateway>::clone(&gateway));

    let outcome = extension.initialize();
    for row in &rows {
        assert_eq!(
            indicator(&page, *row).as_deref(),
            Some("• Reviewed by Loading...")
        );
    }
    gate.release();
    extension.settle().await;

    assert_eq!(outcome, InitOutcome::Active { rows: 2 });
    assert_eq!(gateway.detail_calls(7), 1, "one detail request per PR");
    assert_eq!(gateway.review_calls(7), 1, "one reviews request per PR");
    for row in rows {
        assert_eq!(
            indicator(&page, row).as_deref(),
            Some("• Reviewed by alice, bob")
        );
    }
}

#[rstest]
#[tokio::test]
async fn only_the_newest_lookup_of_a_reprocessed_row_renders(gateway: Arc<ScriptedGateway>) {
    gateway.respond(1, detail(&["alice"], &[]), Vec::new());
    gateway.respond(2, detail(&["bob"], &[]), Vec::new());
    let gate = gateway.hold(1);
    let (page, rows) = list_page(LIST_URL, &[1]);
    let row = rows.first().copied().expect("one row");
    let extension = extension_for(&page, Arc::<ScriptedGateway>::clone(&gateway));
    let _outcome = extension.initialize();

    {
        let mut document = page.document();
        let parent = document.parent(row).expect("row has a container");
        document.detach(row).expect("detach should succeed");
        document
            .set_attribute(row, "id", "issue_2")
            .expect("row is an element");
        document
            .append_child(parent, row)
            .expect("reinsertion should succeed");
    }
    wait_for_indicator(&page, row, "• Reviewed by bob").await;
    gate.release();
    extension.settle().await;

    assert_eq!(gateway.detail_calls(1), 1);
    assert_eq!(indicator(&page, row).as_deref(), Some("• Reviewed by bob"));
}

#[rstest]
#[tokio::test]
async fn retired_sessions_do_not_render(gateway: Arc<ScriptedGateway>) {
    gateway.respond(4, detail(&["alice"], &[]), Vec::new());
    let gate = gateway.hold(4);
    let (page, rows) = list_page(LIST_URL, &[4]);
    let row = rows.first().copied().expect("one row");
    let extension = extension_for(&page, Arc::<ScriptedGateway>::clone(&gateway));
    let _outcome = extension.initialize();
    let first_session = extension.session().expect("session should be active");

    page.push_state("https://github.com/octo/widgets/issues");
    let outcome = extension.initialize();
    gate.release();
    first_session.settle().await;

    assert_eq!(outcome, InitOutcome::Inert);
    assert!(first_session.is_retired());
    assert_eq!(
        indicator(&page, row).as_deref(),
        Some("• Reviewed by Loading..."),
        "results of a retired session are dropped"
    );
}

#[rstest]
#[tokio::test]
async fn credentials_travel_with_each_request(gateway: Arc<ScriptedGateway>) {
    gateway.respond(9, detail(&[], &[]), Vec::new());
    let (page, rows) = list_page(LIST_URL, &[9]);
    let extension = reviewlens::Extension::new(
        page.clone(),
        Arc::<ScriptedGateway>::clone(&gateway),
        support::credentials(Some("ghp_scripted")),
        reviewlens::AnnotatorOptions::default(),
    );

    let _outcome = extension.initialize();
    extension.settle().await;

    let headers = gateway.last_headers().expect("a request was made");
    assert_eq!(
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok()),
        Some("Bearer ghp_scripted")
    );
    let row = rows.first().copied().expect("one row");
    assert_eq!(indicator(&page, row).as_deref(), Some("• Reviewed by None"));
}

#[rstest]
#[tokio::test]
async fn unrelated_pages_share_nothing(gateway: Arc<ScriptedGateway>) {
    gateway.respond(5, detail(&["alice"], &[]), Vec::new());
    let (first_page, first_rows) = list_page(LIST_URL, &[5]);
    let (second_page, second_rows) = list_page(LIST_URL, &[5]);
    let first = extension_for(&first_page, Arc::<ScriptedGateway>::clone(&gateway));
    let second = extension_for(&second_page, Arc::<ScriptedGateway>::clone(&gateway));

    let _first_outcome = first.initialize();
    let _second_outcome = second.initialize();
    first.settle().await;
    second.settle().await;

    assert_eq!(gateway.detail_calls(5), 2, "each page owns its cache");
    for (page, rows) in [(&first_page, &first_rows), (&second_page, &second_rows)] {
        let row = rows.first().copied().expect("one row");
        assert_eq!(indicator(page, row).as_deref(), Some("• Reviewed by alice"));
    }
}

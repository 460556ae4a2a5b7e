//! Finding pull request rows and reading their numbers.

use crate::github::PullRequestNumber;
use crate::page::{Document, NodeId, Selector};

/// Attribute marking a row as already handled.
pub const PROCESSED_ATTRIBUTE: &str = "data-github-show-reviewer-processed";
const PROCESSED_VALUE: &str = "true";

const ID_PREFIX: &str = "issue_";
const PERMALINK_MARKER: &str = "/pull/";

/// Whether `row` carries the processed marker.
#[must_use]
pub fn is_processed(document: &Document, row: NodeId) -> bool {
    document.attribute(row, PROCESSED_ATTRIBUTE) == Some(PROCESSED_VALUE)
}

pub(super) fn mark_processed(document: &mut Document, row: NodeId) {
    if let Err(error) = document.set_attribute(row, PROCESSED_ATTRIBUTE, PROCESSED_VALUE) {
        tracing::trace!("could not mark row processed: {error}");
    }
}

pub(super) fn clear_processed(document: &mut Document, row: NodeId) {
    if let Err(error) = document.remove_attribute(row, PROCESSED_ATTRIBUTE) {
        tracing::trace!("could not clear processed marker: {error}");
    }
}

/// Rows beneath `root` not yet marked processed, in document order.
#[must_use]
pub fn unprocessed_rows(document: &Document, root: NodeId, row: &Selector) -> Vec<NodeId> {
    document
        .query_selector_all(root, row)
        .into_iter()
        .filter(|candidate| !is_processed(document, *candidate))
        .collect()
}

/// Reads the pull request number of `row`.
///
/// The `issue_<digits>` identifier wins; otherwise the first permalink's
/// `/pull/<digits>` is used.
#[must_use]
pub fn extract_pr_number(
    document: &Document,
    row: NodeId,
    permalink: &Selector,
) -> Option<PullRequestNumber> {
    if let Some(number) = document
        .element_id(row)
        .and_then(|id| digits_after(id, ID_PREFIX))
    {
        return Some(number);
    }

    document
        .query_selector(row, permalink)
        .and_then(|link| document.attribute(link, "href"))
        .and_then(|href| digits_after(href, PERMALINK_MARKER))
}

/// Parses the run of ASCII digits following the first `marker` that is
/// followed by at least one digit.
fn digits_after(haystack: &str, marker: &str) -> Option<PullRequestNumber> {
    haystack.match_indices(marker).find_map(|(start, _)| {
        let tail = haystack.get(start + marker.len()..)?;
        let end = tail
            .find(|character: char| !character.is_ascii_digit())
            .unwrap_or(tail.len());
        tail.get(..end)?.parse().ok()
    })
}

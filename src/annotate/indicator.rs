//! The "Reviewed by" indicator attached to each row.

use url::form_urlencoded;

use crate::github::RepoContext;
use crate::page::list_view::INDICATOR_CLASS;
use crate::page::{Document, DocumentError, NodeId, Selector};

use super::options::{AnnotatorOptions, Selectors};

const PREFIX: &str = "• Reviewed by ";
const LOADING_TEXT: &str = "Loading...";
const EMPTY_TEXT: &str = "None";
const FAILED_TEXT: &str = "N/A";
const TITLE_ATTRIBUTE: &str = "title";
const REVIEWER_LINK_CLASS: &str = "reviewer-link";
const REVIEWER_DATA_ATTRIBUTE: &str = "data-reviewer";
const SEARCH_QUERY_PREFIX: &str = "sort%3Aupdated-desc+is%3Apr+review-requested%3A";

/// What an indicator currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState<'a> {
    /// The lookup is in flight.
    Loading,
    /// The lookup succeeded.
    Reviewers(&'a [String]),
    /// The lookup failed with this message.
    Failed(&'a str),
}

/// Finds the indicator inside `row`, creating the inline container and the
/// indicator when they are missing.
///
/// Returns `None` when the row has no metadata line.
pub(super) fn ensure_indicator(
    document: &mut Document,
    row: NodeId,
    selectors: &Selectors,
) -> Result<Option<NodeId>, DocumentError> {
    let Some(meta) = document.query_selector(row, &selectors.meta_container) else {
        return Ok(None);
    };
    let inline = find_or_append(document, meta, &selectors.inline_container)?;
    find_or_append(document, inline, &selectors.indicator).map(Some)
}

fn find_or_append(
    document: &mut Document,
    parent: NodeId,
    selector: &Selector,
) -> Result<NodeId, DocumentError> {
    if let Some(existing) = document.query_selector(parent, selector) {
        return Ok(existing);
    }
    let classes: Vec<&str> = selector.classes().iter().map(String::as_str).collect();
    let created =
        document.create_element_with_classes(selector.tag_name().unwrap_or("span"), &classes);
    document.append_child(parent, created)?;
    Ok(created)
}

/// Writes `state` into `indicator`, toggling the state classes and title.
pub(super) fn render(
    document: &mut Document,
    indicator: NodeId,
    state: IndicatorState<'_>,
    context: &RepoContext,
    options: &AnnotatorOptions,
) -> Result<(), DocumentError> {
    let (succeeded, failed) = match state {
        IndicatorState::Loading => {
            document.set_text(indicator, &format!("{PREFIX}{LOADING_TEXT}"))?;
            (false, false)
        }
        IndicatorState::Reviewers([]) => {
            document.set_text(indicator, &format!("{PREFIX}{EMPTY_TEXT}"))?;
            (true, false)
        }
        IndicatorState::Reviewers(reviewers) => {
            render_reviewers(document, indicator, reviewers, context, options)?;
            (true, false)
        }
        IndicatorState::Failed(_) => {
            document.set_text(indicator, &format!("{PREFIX}{FAILED_TEXT}"))?;
            (false, true)
        }
    };

    document.toggle_class(indicator, &format!("{INDICATOR_CLASS}--success"), succeeded)?;
    document.toggle_class(indicator, &format!("{INDICATOR_CLASS}--error"), failed)?;
    match state {
        IndicatorState::Failed(message) => {
            document.set_attribute(indicator, TITLE_ATTRIBUTE, message)
        }
        IndicatorState::Loading | IndicatorState::Reviewers(_) => {
            document.remove_attribute(indicator, TITLE_ATTRIBUTE)
        }
    }
}

fn render_reviewers(
    document: &mut Document,
    indicator: NodeId,
    reviewers: &[String],
    context: &RepoContext,
    options: &AnnotatorOptions,
) -> Result<(), DocumentError> {
    if !options.link_reviewers {
        return document.set_text(indicator, &format!("{PREFIX}{}", reviewers.join(", ")));
    }

    document.set_text(indicator, PREFIX)?;
    for (position, reviewer) in reviewers.iter().enumerate() {
        if position > 0 {
            let separator = document.create_text(", ");
            document.append_child(indicator, separator)?;
        }
        let name = reviewer.strip_prefix('@').unwrap_or(reviewer);
        let link = document.create_element_with_classes("a", &[REVIEWER_LINK_CLASS]);
        document.set_attribute(link, "href", &reviewer_search_url(options, context, name))?;
        document.set_attribute(link, REVIEWER_DATA_ATTRIBUTE, name)?;
        document.set_text(link, reviewer)?;
        document.append_child(indicator, link)?;
    }
    Ok(())
}

/// Link to the list view filtered by review requests for `name`.
#[must_use]
pub fn reviewer_search_url(options: &AnnotatorOptions, context: &RepoContext, name: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
    format!(
        "{}/{}/{}/pulls?q={SEARCH_QUERY_PREFIX}{encoded}",
        options.web_base.as_str().trim_end_matches('/'),
        context.owner().as_str(),
        context.repository().as_str(),
    )
}

//! Builders for pull request list markup.
//!
//! Produces the row structure GitHub renders on `/owner/repo/pulls`, so the
//! headless CLI and the tests can drive the engine against a realistic tree.

use super::{Document, DocumentError, NodeId, Selector};

/// Class of each pull request row.
pub const ROW_CLASS: &str = "js-issue-row";
/// Classes of the metadata line beneath the title.
pub const META_CLASSES: [&str; 4] = ["d-flex", "mt-1", "text-small", "color-fg-muted"];
/// Class of the primary permalink.
pub const PERMALINK_CLASS: &str = "Link--primary";
/// Class of the reviewer indicator.
pub const INDICATOR_CLASS: &str = "github-show-reviewer";

/// Which optional parts a generated row has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowShape {
    /// Carry an `issue_<n>` identifier.
    pub with_id: bool,
    /// Carry a `/pull/<n>` permalink.
    pub with_permalink: bool,
    /// Carry the metadata line the indicator attaches to.
    pub with_meta: bool,
}

impl RowShape {
    /// A row as GitHub normally renders it.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            with_id: true,
            with_permalink: true,
            with_meta: true,
        }
    }

    /// A row whose number is only discoverable through the permalink.
    #[must_use]
    pub const fn without_id() -> Self {
        Self {
            with_id: false,
            ..Self::full()
        }
    }

    /// A row with no way to derive its number.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            with_id: false,
            with_permalink: false,
            with_meta: true,
        }
    }

    /// A row missing the metadata line.
    #[must_use]
    pub const fn without_meta() -> Self {
        Self {
            with_meta: false,
            ..Self::full()
        }
    }
}

/// Appends the list container rows are inserted into.
///
/// # Errors
///
/// Returns [`DocumentError`] when the root cannot accept children.
pub fn list_container(document: &mut Document) -> Result<NodeId, DocumentError> {
    let container = document.create_element_with_classes("div", &["js-navigation-container"]);
    document.append_child(document.root(), container)?;
    Ok(container)
}

/// Builds a detached row for pull request `number` in `owner/repo`.
///
/// # Errors
///
/// Returns [`DocumentError`] if the freshly created nodes cannot be linked.
pub fn pull_request_row(
    document: &mut Document,
    repository: &str,
    number: u64,
    shape: RowShape,
) -> Result<NodeId, DocumentError> {
    let row = document.create_element_with_classes("div", &[ROW_CLASS, "Box-row"]);
    if shape.with_id {
        document.set_attribute(row, "id", &format!("issue_{number}"))?;
    }

    let title = if shape.with_permalink {
        let link = document.create_element_with_classes("a", &[PERMALINK_CLASS, "h4"]);
        document.set_attribute(link, "href", &format!("/{repository}/pull/{number}"))?;
        link
    } else {
        document.create_element_with_classes("span", &["h4"])
    };
    document.set_text(title, &format!("Pull request {number}"))?;
    document.append_child(row, title)?;

    if shape.with_meta {
        let meta = document.create_element_with_classes("div", &META_CLASSES);
        let opened_by = document.create_element_with_classes("span", &["opened-by"]);
        document.set_text(opened_by, &format!("#{number} opened"))?;
        document.append_child(meta, opened_by)?;
        document.append_child(row, meta)?;
    }

    Ok(row)
}

/// Builds and appends one full row per number.
///
/// # Errors
///
/// Returns [`DocumentError`] when `container` is stale.
pub fn append_rows(
    document: &mut Document,
    container: NodeId,
    repository: &str,
    numbers: &[u64],
) -> Result<Vec<NodeId>, DocumentError> {
    numbers
        .iter()
        .map(|number| {
            let row = pull_request_row(document, repository, *number, RowShape::full())?;
            document.append_child(container, row)?;
            Ok(row)
        })
        .collect()
}

fn indicator(document: &Document, row: NodeId) -> Option<NodeId> {
    document.query_selector(row, &Selector::with_classes(&[INDICATOR_CLASS]))
}

/// Text of the reviewer indicator inside `row`, if one was attached.
#[must_use]
pub fn indicator_text(document: &Document, row: NodeId) -> Option<String> {
    indicator(document, row).map(|node| document.text_content(node))
}

/// Hover title of the reviewer indicator inside `row`.
#[must_use]
pub fn indicator_title(document: &Document, row: NodeId) -> Option<String> {
    indicator(document, row)
        .and_then(|node| document.attribute(node, "title"))
        .map(ToOwned::to_owned)
}

/// Whether the indicator inside `row` carries the given state class suffix,
/// e.g. `error` for `github-show-reviewer--error`.
#[must_use]
pub fn indicator_has_state(document: &Document, row: NodeId, state: &str) -> bool {
    indicator(document, row)
        .is_some_and(|node| document.has_class(node, &format!("{INDICATOR_CLASS}--{state}")))
}

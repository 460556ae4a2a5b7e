//! Driving rows from untouched through loading to a rendered result.

use std::sync::Arc;

use thiserror::Error;

use crate::page::{Document, NodeId, Page};
use crate::reviewers::ReviewerOutcome;

use super::indicator::{self, IndicatorState};
use super::locator::{self, extract_pr_number, is_processed, unprocessed_rows};
use super::options::AnnotatorOptions;
use super::registry::TaskToken;
use super::session::AnnotationSession;

/// Result of asking the annotator to handle a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotateOutcome {
    /// The row now shows the loading state and a lookup is running.
    Started(TaskToken),
    /// The row was already marked processed; nothing changed.
    AlreadyProcessed,
}

/// Why a row was left alone.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RowSkip {
    /// Neither the row `id` nor a permalink yielded a pull request number.
    #[error("no pull request number found in row")]
    ExtractionFailure,

    /// The row has no metadata line to hang the indicator off.
    #[error("row has no metadata container for the indicator")]
    AnchorMissing,

    /// The row handle no longer refers to a live node.
    #[error("row no longer exists")]
    StaleRow,
}

/// Attaches reviewer indicators to rows of a [`Page`].
#[derive(Clone)]
pub struct RowAnnotator {
    page: Page,
    options: Arc<AnnotatorOptions>,
}

impl RowAnnotator {
    /// Creates an annotator writing into `page`.
    #[must_use]
    pub const fn new(page: Page, options: Arc<AnnotatorOptions>) -> Self {
        Self { page, options }
    }

    /// The page being annotated.
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Options in effect.
    #[must_use]
    pub fn options(&self) -> &AnnotatorOptions {
        &self.options
    }

    /// Moves `row` into the loading state and starts its lookup.
    ///
    /// Must be called from within a tokio runtime, which runs the completion.
    ///
    /// # Errors
    ///
    /// Returns [`RowSkip`] when the row cannot be annotated; the row is left
    /// untouched and unmarked.
    pub fn annotate(
        &self,
        session: &Arc<AnnotationSession>,
        row: NodeId,
    ) -> Result<AnnotateOutcome, RowSkip> {
        let mut document = self.page.document();
        self.annotate_in(&mut document, session, row)
    }

    /// Annotates every unprocessed row beneath `root` and returns how many
    /// lookups were started.
    #[must_use]
    pub fn scan(&self, session: &Arc<AnnotationSession>, root: NodeId) -> usize {
        let mut document = self.page.document();
        let mut started = 0;
        for row in unprocessed_rows(&document, root, &self.options.selectors.row) {
            if self.annotate_logged(&mut document, session, row) {
                started += 1;
            }
        }
        started
    }

    /// Handles a freshly inserted element: the element itself when it is a
    /// row, and every row nested inside it, are reset and annotated again.
    #[must_use]
    pub fn annotate_inserted(&self, session: &Arc<AnnotationSession>, node: NodeId) -> usize {
        let mut document = self.page.document();
        if !document.contains(node) {
            return 0;
        }

        let selector = &self.options.selectors.row;
        let mut rows = Vec::new();
        if document.matches(node, selector) {
            rows.push(node);
        }
        rows.extend(document.query_selector_all(node, selector));
        if rows.is_empty() {
            return 0;
        }

        session.tasks().prune(&document);
        let mut started = 0;
        for row in rows {
            locator::clear_processed(&mut document, row);
            if self.annotate_logged(&mut document, session, row) {
                started += 1;
            }
        }
        started
    }

    /// Clears the processed marker on every row, optionally removing any
    /// indicators left by an earlier session. Returns the number of rows.
    #[must_use]
    pub fn reset_rows(&self, clear_indicators: bool) -> usize {
        let mut document = self.page.document();
        let root = document.root();
        if clear_indicators {
            for indicator in document.query_selector_all(root, &self.options.selectors.indicator) {
                if let Err(error) = document.remove(indicator) {
                    tracing::trace!("indicator already gone: {error}");
                }
            }
        }

        let rows = document.query_selector_all(root, &self.options.selectors.row);
        for row in &rows {
            locator::clear_processed(&mut document, *row);
        }
        rows.len()
    }

    fn annotate_logged(
        &self,
        document: &mut Document,
        session: &Arc<AnnotationSession>,
        row: NodeId,
    ) -> bool {
        match self.annotate_in(document, session, row) {
            Ok(AnnotateOutcome::Started(_)) => true,
            Ok(AnnotateOutcome::AlreadyProcessed) => false,
            Err(skip) => {
                tracing::debug!(?row, "skipping row: {skip}");
                false
            }
        }
    }

    fn annotate_in(
        &self,
        document: &mut Document,
        session: &Arc<AnnotationSession>,
        row: NodeId,
    ) -> Result<AnnotateOutcome, RowSkip> {
        if !document.contains(row) {
            return Err(RowSkip::StaleRow);
        }
        if is_processed(document, row) {
            return Ok(AnnotateOutcome::AlreadyProcessed);
        }

        let selectors = &self.options.selectors;
        let number =
            extract_pr_number(document, row, &selectors.permalink).ok_or(RowSkip::ExtractionFailure)?;
        let indicator = indicator::ensure_indicator(document, row, selectors)
            .map_err(|_| RowSkip::StaleRow)?
            .ok_or(RowSkip::AnchorMissing)?;

        locator::mark_processed(document, row);
        if let Err(error) = indicator::render(
            document,
            indicator,
            IndicatorState::Loading,
            session.context(),
            &self.options,
        ) {
            tracing::trace!("could not render loading state: {error}");
        }

        let lookup = session.fetcher().fetch(number);
        let token = session.tasks().begin(row);
        tracing::debug!(pull_request = number.get(), ?token, "row annotation started");

        let annotator = self.clone();
        let task_session = Arc::clone(session);
        let completion = tokio::spawn(async move {
            let outcome = lookup.await;
            annotator.complete(&task_session, row, indicator, token, &outcome);
        });
        session.tasks().track(completion);
        Ok(AnnotateOutcome::Started(token))
    }

    fn complete(
        &self,
        session: &AnnotationSession,
        row: NodeId,
        indicator: NodeId,
        token: TaskToken,
        outcome: &ReviewerOutcome,
    ) {
        let mut document = self.page.document();
        if session.is_retired() || !session.tasks().is_current(row, token) {
            tracing::trace!(?row, ?token, "dropping superseded reviewer result");
            return;
        }
        if !document.contains(row) || !document.contains(indicator) {
            tracing::trace!(?row, "row removed before reviewers arrived");
            return;
        }

        let state = match outcome {
            ReviewerOutcome::Reviewers(reviewers) => IndicatorState::Reviewers(reviewers),
            ReviewerOutcome::Error(message) => IndicatorState::Failed(message),
        };
        if let Err(error) =
            indicator::render(&mut document, indicator, state, session.context(), &self.options)
        {
            tracing::trace!("could not render reviewer result: {error}");
        }
    }
}

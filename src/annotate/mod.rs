//! Row annotation: locating pull request rows, attaching the reviewer
//! indicator, and rendering lookup results.
//!
//! A row moves from untouched to loading when [`RowAnnotator`] marks it
//! processed and starts a lookup, and from loading to success or error when
//! the lookup settles. Every lookup carries a [`TaskToken`]; results whose
//! token is no longer the row's newest are dropped, as are results for rows
//! that were removed in the meantime.

mod annotator;
mod indicator;
mod locator;
mod options;
mod registry;
mod session;
mod watcher;

pub use annotator::{AnnotateOutcome, RowAnnotator, RowSkip};
pub use indicator::{IndicatorState, reviewer_search_url};
pub use locator::{PROCESSED_ATTRIBUTE, extract_pr_number, is_processed, unprocessed_rows};
pub use options::{AnnotatorOptions, DEFAULT_WEB_BASE, Selectors};
pub use registry::{RowTaskRegistry, TaskToken};
pub use session::{AnnotationSession, SessionSlot};
pub use watcher::MutationWatcher;

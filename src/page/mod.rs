//! In-process model of the host page.
//!
//! The annotation engine never owns the page: the host mutates the tree and
//! changes the location whenever it likes. [`Page`] bundles the shared
//! [`Document`], the current location, and the history (back/forward)
//! signal so the engine can react to all three.

mod document;
pub mod list_view;
mod selector;

pub use document::{Document, DocumentError, MutationRecord, NodeId};
pub use selector::{AttributeTest, Selector, SelectorError};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

/// Buffered history signals per subscriber before older ones are dropped.
const HISTORY_CHANNEL_CAPACITY: usize = 16;

/// Shared handle to the host page.
///
/// Cloning is cheap; every clone sees the same document and location.
#[derive(Debug, Clone)]
pub struct Page {
    document: Arc<Mutex<Document>>,
    location: Arc<Mutex<String>>,
    history: broadcast::Sender<()>,
}

impl Page {
    /// Creates a page showing an empty document at `location`.
    #[must_use]
    pub fn new(location: &str) -> Self {
        Self::with_document(location, Document::new())
    }

    /// Creates a page around an existing document.
    #[must_use]
    pub fn with_document(location: &str, document: Document) -> Self {
        let (history, _) = broadcast::channel(HISTORY_CHANNEL_CAPACITY);
        Self {
            document: Arc::new(Mutex::new(document)),
            location: Arc::new(Mutex::new(location.to_owned())),
            history,
        }
    }

    /// Locks the document for one synchronous section.
    ///
    /// Never hold the guard across an `.await`.
    pub fn document(&self) -> MutexGuard<'_, Document> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current location (`href`).
    #[must_use]
    pub fn location(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Changes the location in place, as `history.pushState` does.
    ///
    /// No signal is emitted; pollers notice the change on their next tick.
    pub fn push_state(&self, location: &str) {
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = location.to_owned();
    }

    /// Changes the location and emits a history signal, as back/forward do.
    pub fn pop_state(&self, location: &str) {
        self.push_state(location);
        // Nobody listening is fine.
        let _receivers = self.history.send(());
    }

    /// Subscribes to history (back/forward) signals.
    #[must_use]
    pub fn subscribe_history(&self) -> broadcast::Receiver<()> {
        self.history.subscribe()
    }
}

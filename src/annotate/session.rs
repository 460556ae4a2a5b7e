//! State scoped to one visit of a list view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::github::RepoContext;
use crate::reviewers::ReviewerFetcher;

use super::registry::RowTaskRegistry;

/// Reviewer cache and row tasks for one repository context.
///
/// A new session is built on every navigation. Installing it retires the
/// previous one, and completions of a retired session render nothing.
pub struct AnnotationSession {
    fetcher: ReviewerFetcher,
    tasks: RowTaskRegistry,
    retired: AtomicBool,
}

impl AnnotationSession {
    /// Wraps a fetcher with an empty task registry.
    #[must_use]
    pub fn new(fetcher: ReviewerFetcher) -> Self {
        Self {
            fetcher,
            tasks: RowTaskRegistry::default(),
            retired: AtomicBool::new(false),
        }
    }

    /// Whether a newer session replaced this one.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    /// Repository the session annotates.
    #[must_use]
    pub const fn context(&self) -> &RepoContext {
        self.fetcher.context()
    }

    /// The session's reviewer fetcher.
    #[must_use]
    pub const fn fetcher(&self) -> &ReviewerFetcher {
        &self.fetcher
    }

    /// The session's row task registry.
    #[must_use]
    pub const fn tasks(&self) -> &RowTaskRegistry {
        &self.tasks
    }

    /// Waits for every started row to leave the loading state.
    pub async fn settle(&self) {
        self.tasks.settle().await;
    }
}

/// Shared slot holding the active session, if any.
#[derive(Clone, Default)]
pub struct SessionSlot {
    current: Arc<Mutex<Option<Arc<AnnotationSession>>>>,
}

impl SessionSlot {
    /// The active session.
    #[must_use]
    pub fn current(&self) -> Option<Arc<AnnotationSession>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs `session`, retiring the one it replaces.
    pub fn replace(&self, session: Arc<AnnotationSession>) {
        self.swap(Some(session));
    }

    /// Retires and drops the active session.
    pub fn clear(&self) {
        self.swap(None);
    }

    fn swap(&self, next: Option<Arc<AnnotationSession>>) {
        let previous = std::mem::replace(
            &mut *self.current.lock().unwrap_or_else(PoisonError::into_inner),
            next,
        );
        if let Some(session) = previous {
            session.retire();
        }
    }
}

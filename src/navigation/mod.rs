//! Session lifecycle across in-page navigation.
//!
//! [`Extension`] owns the annotation pipeline for one [`Page`]. Each call to
//! [`Extension::initialize`] re-derives the repository from the current
//! location and either starts a fresh [`AnnotationSession`] or goes inert.
//! [`NavigationMonitor`] calls it whenever the location changes.

mod monitor;

pub use monitor::{MIN_POLL_INTERVAL, MonitorTiming, NavigationMonitor};

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::annotate::{
    AnnotationSession, AnnotatorOptions, MutationWatcher, RowAnnotator, SessionSlot,
};
use crate::credentials::CredentialProvider;
use crate::github::{RepoContext, ReviewerGateway};
use crate::page::Page;
use crate::reviewers::ReviewerFetcher;

const SESSION_CHECK_PERIOD: Duration = Duration::from_millis(10);

/// What [`Extension::initialize`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// The location is not a pull request list view; nothing is watched.
    Inert,
    /// A new session started and the initial scan began `rows` lookups.
    Active {
        /// Rows whose lookup started during the initial scan.
        rows: usize,
    },
}

struct ExtensionInner {
    annotator: RowAnnotator,
    gateway: Arc<dyn ReviewerGateway>,
    credentials: CredentialProvider,
    sessions: SessionSlot,
    watcher: Mutex<Option<MutationWatcher>>,
}

/// Reviewer annotation for one page.
///
/// Cloning is cheap; clones drive the same sessions and watcher.
#[derive(Clone)]
pub struct Extension {
    inner: Arc<ExtensionInner>,
}

impl Extension {
    /// Wires the pipeline for `page`. Nothing runs until
    /// [`Extension::initialize`] or [`Extension::start`].
    #[must_use]
    pub fn new(
        page: Page,
        gateway: Arc<dyn ReviewerGateway>,
        credentials: CredentialProvider,
        options: AnnotatorOptions,
    ) -> Self {
        Self {
            inner: Arc::new(ExtensionInner {
                annotator: RowAnnotator::new(page, Arc::new(options)),
                gateway,
                credentials,
                sessions: SessionSlot::default(),
                watcher: Mutex::new(None),
            }),
        }
    }

    /// The page being annotated.
    #[must_use]
    pub fn page(&self) -> &Page {
        self.inner.annotator.page()
    }

    /// The active session, if the page is a list view.
    #[must_use]
    pub fn session(&self) -> Option<Arc<AnnotationSession>> {
        self.inner.sessions.current()
    }

    /// Whether inserted rows are currently being watched.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.watcher().as_ref().is_some_and(MutationWatcher::is_active)
    }

    fn watcher(&self) -> std::sync::MutexGuard<'_, Option<MutationWatcher>> {
        self.inner
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new session for the current location, or goes inert when the
    /// location is not a list view.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn initialize(&self) -> InitOutcome {
        let annotator = &self.inner.annotator;
        let options = annotator.options();
        let location = self.page().location();
        let context = match RepoContext::from_location(&location, options.host()) {
            Ok(context) => context,
            Err(error) => {
                tracing::debug!("annotation inactive: {error}");
                self.deactivate();
                return InitOutcome::Inert;
            }
        };

        let fetcher = ReviewerFetcher::new(
            context,
            Arc::clone(&self.inner.gateway),
            self.inner.credentials.clone(),
            options.cache_policy,
        )
        .with_author_exclusion(options.exclude_author);
        let session = Arc::new(AnnotationSession::new(fetcher));
        self.inner.sessions.replace(Arc::clone(&session));

        let _existing = annotator.reset_rows(options.clear_indicators_on_navigation);
        self.ensure_watcher();

        let root = self.page().document().root();
        let rows = annotator.scan(&session, root);
        tracing::info!(
            owner = session.context().owner().as_str(),
            repository = session.context().repository().as_str(),
            rows,
            "annotation session started"
        );
        InitOutcome::Active { rows }
    }

    /// Runs [`Extension::initialize`] once, then watches for navigation.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(&self, timing: MonitorTiming) -> ExtensionHandle {
        let _outcome = self.initialize();
        let monitor = NavigationMonitor::new(self.clone(), timing);
        ExtensionHandle {
            extension: self.clone(),
            timing,
            monitor: tokio::spawn(monitor.run()),
        }
    }

    /// Waits until every row of the active session has left loading.
    pub async fn settle(&self) {
        if let Some(session) = self.session() {
            session.settle().await;
        }
    }

    fn ensure_watcher(&self) {
        let mut watcher = self.watcher();
        if watcher.as_ref().is_some_and(MutationWatcher::is_active) {
            return;
        }
        *watcher = Some(MutationWatcher::install(
            self.inner.annotator.clone(),
            self.inner.sessions.clone(),
        ));
    }

    fn deactivate(&self) {
        self.inner.sessions.clear();
        if let Some(watcher) = self.watcher().take() {
            watcher.disconnect();
        }
    }
}

/// Running extension; stops the monitor and the watcher when dropped.
pub struct ExtensionHandle {
    extension: Extension,
    timing: MonitorTiming,
    monitor: JoinHandle<()>,
}

impl ExtensionHandle {
    /// The running extension.
    #[must_use]
    pub const fn extension(&self) -> &Extension {
        &self.extension
    }

    /// Moves the page to `location` as a history navigation would, then
    /// waits for the monitor to pick it up and for the new session's lookups
    /// to finish.
    ///
    /// Returns `false` when no re-initialisation was seen within one poll
    /// period plus the settle delay, e.g. because the location did not
    /// change or the page stayed inert.
    #[must_use]
    pub async fn navigate(&self, location: &str) -> bool {
        let previous = self.extension.session();
        self.extension.page().pop_state(location);
        let deadline = self.timing.effective_poll_interval() + self.timing.settle_delay;
        let replaced = tokio::time::timeout(deadline, self.session_replaced(previous))
            .await
            .is_ok();
        self.extension.settle().await;
        replaced
    }

    async fn session_replaced(&self, previous: Option<Arc<AnnotationSession>>) {
        loop {
            let replaced = match (previous.as_ref(), self.extension.session()) {
                (Some(before), Some(after)) => !Arc::ptr_eq(before, &after),
                (None, None) => false,
                _ => true,
            };
            if replaced {
                return;
            }
            tokio::time::sleep(SESSION_CHECK_PERIOD).await;
        }
    }

    /// Stops navigation monitoring and insertion watching.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for ExtensionHandle {
    fn drop(&mut self) {
        self.monitor.abort();
        self.extension.deactivate();
    }
}

#[cfg(test)]
mod tests;

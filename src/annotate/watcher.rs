//! Reacting to rows inserted after the initial scan.

use tokio::task::JoinHandle;

use crate::page::MutationRecord;

use super::annotator::RowAnnotator;
use super::session::SessionSlot;

/// Background task draining document insertions into the annotator.
///
/// Dropping the watcher disconnects it.
#[derive(Debug)]
pub struct MutationWatcher {
    task: JoinHandle<()>,
}

impl MutationWatcher {
    /// Subscribes to the annotator's page and starts the drain task.
    ///
    /// Insertions are handled with whatever session `sessions` holds at the
    /// time; while it is empty they are ignored.
    #[must_use]
    pub fn install(annotator: RowAnnotator, sessions: SessionSlot) -> Self {
        let mut records = annotator.page().document().observe();
        let task = tokio::spawn(async move {
            while let Some(record) = records.recv().await {
                let Some(session) = sessions.current() else {
                    continue;
                };
                match record {
                    MutationRecord::Added(node) => {
                        let started = annotator.annotate_inserted(&session, node);
                        if started > 0 {
                            tracing::debug!(started, "annotated inserted rows");
                        }
                    }
                }
            }
        });
        Self { task }
    }

    /// Whether the drain task is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops watching for insertions.
    pub fn disconnect(self) {
        drop(self);
    }
}

impl Drop for MutationWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

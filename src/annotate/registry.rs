//! Per-row task tokens used to drop superseded results.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::task::JoinHandle;

use crate::page::{Document, NodeId};

/// Identifies one annotation attempt for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskToken(u64);

#[derive(Debug, Default)]
struct RegistryState {
    next: u64,
    current: HashMap<NodeId, TaskToken>,
    completions: Vec<JoinHandle<()>>,
}

/// Tracks the current task per row and the completions still running.
#[derive(Debug, Default)]
pub struct RowTaskRegistry {
    state: Mutex<RegistryState>,
}

impl RowTaskRegistry {
    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a new task for `row`, superseding any earlier one.
    #[must_use]
    pub fn begin(&self, row: NodeId) -> TaskToken {
        let mut state = self.lock();
        state.next += 1;
        let token = TaskToken(state.next);
        state.current.insert(row, token);
        token
    }

    /// Whether `token` is still the newest task for `row`.
    #[must_use]
    pub fn is_current(&self, row: NodeId, token: TaskToken) -> bool {
        self.lock().current.get(&row) == Some(&token)
    }

    /// Forgets rows that no longer exist in `document`.
    pub fn prune(&self, document: &Document) {
        self.lock().current.retain(|row, _| document.contains(*row));
    }

    /// Number of rows with a recorded task.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().current.len()
    }

    /// Whether no row has a recorded task.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().current.is_empty()
    }

    pub(super) fn track(&self, completion: JoinHandle<()>) {
        let mut state = self.lock();
        state.completions.retain(|handle| !handle.is_finished());
        state.completions.push(completion);
    }

    /// Waits until every tracked completion, including ones started while
    /// waiting, has finished.
    pub async fn settle(&self) {
        loop {
            let pending = std::mem::take(&mut self.lock().completions);
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(error) = handle.await {
                    tracing::warn!("row completion task failed: {error}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::RowTaskRegistry;
    use crate::page::Document;

    #[rstest]
    fn newer_tasks_supersede_older_ones() {
        let mut document = Document::new();
        let row = document.create_element("div");
        let registry = RowTaskRegistry::default();

        let first = registry.begin(row);
        let second = registry.begin(row);

        assert!(first < second);
        assert!(!registry.is_current(row, first));
        assert!(registry.is_current(row, second));
    }

    #[rstest]
    fn tokens_are_scoped_to_their_row() {
        let mut document = Document::new();
        let first_row = document.create_element("div");
        let second_row = document.create_element("div");
        let registry = RowTaskRegistry::default();

        let token = registry.begin(first_row);

        assert!(!registry.is_current(second_row, token));
    }

    #[rstest]
    fn prune_drops_removed_rows() {
        let mut document = Document::new();
        let kept = document.create_element("div");
        let removed = document.create_element("div");
        let registry = RowTaskRegistry::default();
        let _kept_token = registry.begin(kept);
        let _removed_token = registry.begin(removed);

        document.remove(removed).expect("remove should succeed");
        registry.prune(&document);

        assert_eq!(registry.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn settle_waits_for_tracked_completions() {
        let registry = RowTaskRegistry::default();
        let (sender, receiver) = tokio::sync::oneshot::channel::<()>();
        registry.track(tokio::spawn(async move {
            receiver.await.ok();
        }));
        sender.send(()).ok();

        registry.settle().await;

        assert!(registry.lock().completions.is_empty());
    }
}

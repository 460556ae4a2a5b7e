//! Session cache of in-flight and resolved reviewer lookups.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;

use super::ReviewerOutcome;

/// How long resolved lookups stay cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// Lifetime of a resolved entry; `None` keeps it for the whole session.
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    /// Keeps every resolved entry, errors included, until navigation.
    #[must_use]
    pub const fn session() -> Self {
        Self { ttl: None }
    }

    /// Evicts resolved entries `ttl` after they resolve.
    #[must_use]
    pub const fn expiring_after(ttl: Duration) -> Self {
        Self { ttl: Some(ttl) }
    }

    fn is_expired(self, resolved_at: Instant, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(resolved_at) >= ttl)
    }
}

/// Outcome stamped with the instant the lookup finished.
#[derive(Debug, Clone)]
pub(super) struct Resolution {
    pub(super) outcome: ReviewerOutcome,
    pub(super) resolved_at: Instant,
}

pub(super) type SharedLookup = Shared<BoxFuture<'static, Resolution>>;

/// Map from `owner/repo#n` to the one lookup started for that key.
pub(super) struct ReviewerCache {
    policy: CachePolicy,
    entries: Mutex<HashMap<String, SharedLookup>>,
}

impl ReviewerCache {
    pub(super) fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached lookup for `key`, or stores and returns the one
    /// built by `start`. Lookup and insert share one lock acquisition.
    pub(super) fn get_or_start(
        &self,
        key: &str,
        start: impl FnOnce() -> SharedLookup,
    ) -> SharedLookup {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(key) {
            let expired = existing
                .peek()
                .is_some_and(|resolved| self.policy.is_expired(resolved.resolved_at, Instant::now()));
            if !expired {
                return existing.clone();
            }
            tracing::debug!(cache_key = key, "reviewer cache entry expired");
        }

        let lookup = start();
        entries.insert(key.to_owned(), lookup.clone());
        lookup
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

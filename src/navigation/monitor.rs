//! Detecting location changes by polling and history signals.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;

use super::Extension;

/// Default location poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
/// Default pause between noticing a change and re-initialising.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);
/// Shortest poll period the monitor will use; smaller values are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// How often the location is checked and how long to wait before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorTiming {
    /// Period of the location poll.
    pub poll_interval: Duration,
    /// Delay between detecting a change and re-initialising, giving the host
    /// time to render the new view.
    pub settle_delay: Duration,
}

impl MonitorTiming {
    /// The poll period actually used, never below [`MIN_POLL_INTERVAL`].
    #[must_use]
    pub fn effective_poll_interval(&self) -> Duration {
        self.poll_interval.max(MIN_POLL_INTERVAL)
    }
}

impl Default for MonitorTiming {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Re-initialises an [`Extension`] whenever the page location changes.
pub struct NavigationMonitor {
    extension: Extension,
    timing: MonitorTiming,
    last_location: String,
    history: broadcast::Receiver<()>,
}

impl NavigationMonitor {
    /// Creates a monitor treating the current location as already handled.
    ///
    /// History signals are buffered from this point on.
    #[must_use]
    pub fn new(extension: Extension, timing: MonitorTiming) -> Self {
        let last_location = extension.page().location();
        let history = extension.page().subscribe_history();
        Self {
            extension,
            timing,
            last_location,
            history,
        }
    }

    /// Polls and listens for history signals until the task is aborted.
    pub async fn run(mut self) {
        let mut history_open = true;
        let mut ticker = tokio::time::interval(self.timing.effective_poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                signal = self.history.recv(), if history_open => match signal {
                    Ok(()) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => {
                        history_open = false;
                        continue;
                    }
                },
            }
            let _changed = self.check().await;
        }
    }

    /// Compares the location with the last one seen and, on a change, waits
    /// the settle delay and re-initialises. Returns whether it did.
    pub async fn check(&mut self) -> bool {
        let current = self.extension.page().location();
        if current == self.last_location {
            return false;
        }
        tracing::debug!(from = %self.last_location, to = %current, "location changed");
        self.last_location = current;
        tokio::time::sleep(self.timing.settle_delay).await;
        let outcome = self.extension.initialize();
        tracing::debug!(?outcome, "re-initialised after navigation");
        true
    }
}

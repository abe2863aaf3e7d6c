//! Refresh driver feeding provider snapshots into a [`CountdownEngine`].
//!
//! A refresh can run in one step with [`CountdownRefresher::refresh`], or be
//! split so the fetch runs elsewhere and the result is handed back with
//! [`CountdownRefresher::record`].

use tracing::{debug, warn};

use crate::api::ApiError;
use crate::models::CountdownSnapshot;

use super::{CountdownEngine, RemainingTimeProvider};

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// The countdown view was opened
    Mount,
    /// Connectivity came back after a failed refresh
    Reconnect,
    /// The view regained focus
    Focus,
    /// Periodic refresh
    Interval,
    /// Explicit user request
    Manual,
}

impl RefreshTrigger {
    pub fn name(self) -> &'static str {
        match self {
            RefreshTrigger::Mount => "mount",
            RefreshTrigger::Reconnect => "reconnect",
            RefreshTrigger::Focus => "focus",
            RefreshTrigger::Interval => "interval",
            RefreshTrigger::Manual => "manual",
        }
    }
}

#[derive(Debug)]
pub enum RefreshOutcome {
    /// The snapshot carried a new total and the countdown restarted from it
    Adopted,
    /// The snapshot repeated the last adopted total
    Unchanged,
    /// The fetch failed; the countdown keeps ticking from its current value
    Failed(ApiError),
}

/// Fetches snapshots from a provider and feeds them to a [`CountdownEngine`].
pub struct CountdownRefresher<P> {
    provider: P,
    last_failed: bool,
}

impl<P: RemainingTimeProvider> CountdownRefresher<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            last_failed: false,
        }
    }

    pub async fn refresh(
        &mut self,
        engine: &mut CountdownEngine,
        trigger: RefreshTrigger,
    ) -> RefreshOutcome {
        debug!(provider = self.provider.name(), trigger = trigger.name(), "Refreshing countdown");
        let result = self.provider.fetch_snapshot().await;
        self.record(engine, trigger, result)
    }

    /// Apply the result of a fetch that ran outside [`Self::refresh`].
    pub fn record(
        &mut self,
        engine: &mut CountdownEngine,
        trigger: RefreshTrigger,
        result: Result<CountdownSnapshot, ApiError>,
    ) -> RefreshOutcome {
        match result {
            Ok(snapshot) => {
                self.last_failed = false;
                if engine.deliver(snapshot) {
                    RefreshOutcome::Adopted
                } else {
                    RefreshOutcome::Unchanged
                }
            }
            Err(e) => {
                self.last_failed = true;
                warn!(
                    provider = self.provider.name(),
                    trigger = trigger.name(),
                    error = %e,
                    "Countdown refresh failed, keeping local value"
                );
                RefreshOutcome::Failed(e)
            }
        }
    }

    /// Trigger for the next scheduled refresh: a reconnect after a failure,
    /// otherwise a plain interval refresh.
    pub fn next_trigger(&self) -> RefreshTrigger {
        if self.last_failed {
            RefreshTrigger::Reconnect
        } else {
            RefreshTrigger::Interval
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

//! Countdown reconciliation engine.
//!
//! Countdown state is shared with the ticker task, so every access goes
//! through one short-held mutex.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::models::CountdownSnapshot;

use super::{Breakdown, TickerHandle};

/// Status shown once the event has started and the countdown reached zero
pub const EVENT_STARTED_MESSAGE: &str = "The exam has started!";

/// Status shown until a snapshot with a message has arrived
pub const LOADING_MESSAGE: &str = "Loading...";

const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct CountdownState {
    remaining: Option<u64>,
    last_adopted_total: Option<u64>,
    snapshot: Option<CountdownSnapshot>,
    synced_at: Option<DateTime<Utc>>,
}

impl CountdownState {
    /// One tick: decrement by one, floored at zero. Returns the new value.
    fn step(&mut self) -> Option<u64> {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.remaining
    }
}

fn lock(state: &Mutex<CountdownState>) -> MutexGuard<'_, CountdownState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reconciles server countdown snapshots with a local one-second clock.
///
/// A snapshot replaces the local value only when its total differs from the
/// last adopted total, so refetching unchanged data never resets the display.
/// Between snapshots an owned ticker decrements the value once per second
/// until it reaches zero.
pub struct CountdownEngine {
    state: Arc<Mutex<CountdownState>>,
    ticker: Option<TickerHandle>,
    auto_tick: bool,
}

impl CountdownEngine {
    /// Engine with its own ticker. Must be used inside a tokio runtime.
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            ticker: None,
            auto_tick: true,
        }
    }

    /// Engine without a ticker; the caller advances it with [`Self::tick`].
    pub fn manual() -> Self {
        Self {
            auto_tick: false,
            ..Self::new()
        }
    }

    /// Feed a freshly fetched snapshot. Returns whether its total was adopted.
    pub fn deliver(&mut self, snapshot: CountdownSnapshot) -> bool {
        let total = snapshot.total_seconds();
        let adopted = {
            let mut state = lock(&self.state);
            state.snapshot = Some(snapshot);
            state.synced_at = Some(Utc::now());
            if state.last_adopted_total == Some(total) {
                false
            } else {
                state.last_adopted_total = Some(total);
                state.remaining = Some(total);
                true
            }
        };

        if adopted {
            debug!(total, "Adopted countdown snapshot");
            self.restart_ticker();
        } else {
            trace!(total, "Snapshot total unchanged, keeping local countdown");
        }
        adopted
    }

    fn restart_ticker(&mut self) {
        if let Some(old) = self.ticker.take() {
            old.cancel();
        }
        if !self.auto_tick || !matches!(self.remaining(), Some(r) if r > 0) {
            return;
        }

        let state = Arc::clone(&self.state);
        self.ticker = Some(TickerHandle::spawn(TICK_PERIOD, move || {
            let remaining = lock(&state).step();
            matches!(remaining, Some(r) if r > 0)
        }));
    }

    /// Advance the countdown by one second. Returns the new remaining value.
    pub fn tick(&self) -> Option<u64> {
        lock(&self.state).step()
    }

    /// Stop the ticker. The current value is kept.
    pub fn dispose(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(TickerHandle::is_running)
    }

    /// Remaining seconds, or `None` before the first snapshot.
    pub fn remaining(&self) -> Option<u64> {
        lock(&self.state).remaining
    }

    pub fn breakdown(&self) -> Breakdown {
        Breakdown::from_seconds(self.remaining().unwrap_or(0))
    }

    pub fn status_text(&self) -> String {
        let state = lock(&self.state);
        match &state.snapshot {
            Some(snapshot) if snapshot.started && state.remaining.unwrap_or(0) == 0 => {
                EVENT_STARTED_MESSAGE.to_string()
            }
            Some(snapshot) => snapshot
                .message
                .clone()
                .unwrap_or_else(|| LOADING_MESSAGE.to_string()),
            None => LOADING_MESSAGE.to_string(),
        }
    }

    pub fn snapshot(&self) -> Option<CountdownSnapshot> {
        lock(&self.state).snapshot.clone()
    }

    /// When the last snapshot was received.
    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        lock(&self.state).synced_at
    }
}

impl Default for CountdownEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time;

    fn seconds(n: i64) -> CountdownSnapshot {
        CountdownSnapshot::new(0, 0, 0, n)
    }

    #[test]
    fn test_ticks_down_to_zero_and_stays() {
        let mut engine = CountdownEngine::manual();
        assert!(engine.deliver(seconds(5)));

        for _ in 0..5 {
            engine.tick();
        }
        assert_eq!(engine.breakdown(), Breakdown::default());

        engine.tick();
        assert_eq!(engine.remaining(), Some(0));
        assert_eq!(engine.breakdown(), Breakdown::default());
    }

    #[test]
    fn test_redelivered_total_does_not_reset() {
        let mut engine = CountdownEngine::manual();
        engine.deliver(seconds(5));
        engine.tick();
        engine.tick();
        assert_eq!(engine.remaining(), Some(3));

        assert!(!engine.deliver(seconds(5)));
        assert_eq!(engine.remaining(), Some(3));
    }

    #[test]
    fn test_changed_total_is_adopted() {
        let mut engine = CountdownEngine::manual();
        engine.deliver(CountdownSnapshot::new(0, 0, 1, 0));
        engine.tick();
        assert!(engine.deliver(CountdownSnapshot::new(0, 1, 0, 0)));
        assert_eq!(engine.remaining(), Some(3600));
        assert_eq!(
            engine.breakdown(),
            Breakdown { days: 0, hours: 1, minutes: 0, seconds: 0 }
        );
    }

    #[test]
    fn test_tick_before_snapshot_is_noop() {
        let engine = CountdownEngine::manual();
        assert_eq!(engine.tick(), None);
        assert_eq!(engine.remaining(), None);
        assert!(engine.breakdown().is_zero());
    }

    #[test]
    fn test_status_text() {
        let mut engine = CountdownEngine::manual();
        assert_eq!(engine.status_text(), LOADING_MESSAGE);

        engine.deliver(CountdownSnapshot {
            seconds: 1,
            started: true,
            message: Some("Exam starts soon".to_string()),
            ..CountdownSnapshot::default()
        });
        assert_eq!(engine.status_text(), "Exam starts soon");

        engine.tick();
        assert_eq!(engine.status_text(), EVENT_STARTED_MESSAGE);
    }

    #[test]
    fn test_negative_snapshot_reports_started() {
        let mut engine = CountdownEngine::manual();
        engine.deliver(seconds(30));
        engine.tick();

        let started: CountdownSnapshot = serde_json::from_str(
            r#"{"days":0,"hours":0,"minutes":-1,"seconds":-3,"isStarted":true,"message":"In progress"}"#,
        )
        .expect("parse started countdown");
        assert!(engine.deliver(started));
        assert_eq!(engine.remaining(), Some(0));
        assert_eq!(engine.status_text(), EVENT_STARTED_MESSAGE);
    }

    #[test]
    fn test_status_text_without_message() {
        let mut engine = CountdownEngine::manual();
        engine.deliver(seconds(10));
        assert_eq!(engine.status_text(), LOADING_MESSAGE);
        assert!(engine.synced_at().is_some());
    }

    #[test]
    fn test_redundant_snapshot_still_updates_status() {
        let mut engine = CountdownEngine::manual();
        engine.deliver(seconds(10));
        engine.deliver(CountdownSnapshot {
            message: Some("Room 4".to_string()),
            ..seconds(10)
        });
        assert_eq!(engine.status_text(), "Room 4");
        assert_eq!(engine.remaining(), Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_counts_down_and_stops_at_zero() {
        let mut engine = CountdownEngine::new();
        engine.deliver(seconds(5));
        assert!(engine.is_ticking());

        time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(engine.remaining(), Some(3));

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(engine.remaining(), Some(0));
        assert!(!engine.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_snapshot_starts_no_ticker() {
        let mut engine = CountdownEngine::new();
        engine.deliver(seconds(0));
        assert!(!engine.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacing_snapshot_does_not_double_rate() {
        let mut engine = CountdownEngine::new();
        engine.deliver(seconds(10));
        time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(engine.remaining(), Some(8));

        engine.deliver(seconds(20));
        time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(engine.remaining(), Some(17));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_stops_ticking() {
        let mut engine = CountdownEngine::new();
        engine.deliver(seconds(10));
        time::sleep(Duration::from_millis(1_500)).await;
        engine.dispose();

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(engine.remaining(), Some(9));
        assert!(!engine.is_ticking());
    }
}

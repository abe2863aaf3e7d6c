use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Owned handle to a recurring step running on the tokio runtime.
///
/// Dropping the handle cancels the task, so replacing a ticker can never
/// leave the old one running alongside the new one.
#[derive(Debug)]
pub struct TickerHandle {
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Run `step` every `period`, first after one full period.
    ///
    /// The task ends on its own once `step` returns `false`.
    pub fn spawn<F>(period: Duration, mut step: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !step() {
                    break;
                }
            }
        });
        Self { task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stops_when_step_declines() {
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        let ticker = TickerHandle::spawn(Duration::from_secs(1), move || {
            seen.fetch_add(1, Ordering::SeqCst) + 1 < 3
        });

        time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_task() {
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        let ticker = TickerHandle::spawn(Duration::from_secs(1), move || {
            seen.fetch_add(1, Ordering::SeqCst);
            true
        });

        time::sleep(Duration::from_millis(2_500)).await;
        ticker.cancel();
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}

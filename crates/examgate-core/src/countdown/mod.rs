//! Exam countdown reconciliation.
//!
//! The server reports remaining time as a snapshot whenever it is fetched
//! (on open, reconnect, focus or a timer). `CountdownEngine` adopts a
//! snapshot only when its total changed and otherwise keeps counting down
//! locally, once per second, so the display never jumps back on a redundant
//! refetch.

pub mod breakdown;
pub mod engine;
pub mod provider;
pub mod refresh;
pub mod ticker;

pub use breakdown::Breakdown;
pub use engine::{CountdownEngine, EVENT_STARTED_MESSAGE, LOADING_MESSAGE};
pub use provider::{ExamCountdownProvider, RemainingTimeProvider, UserStatsProvider};
pub use refresh::{CountdownRefresher, RefreshOutcome, RefreshTrigger};
pub use ticker::TickerHandle;

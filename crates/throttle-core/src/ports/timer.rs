//! Single-shot timer port.
//!
//! This port defines the deferred-execution primitive the gate relies on.
//! Implementations handle all runtime details (task spawning, timer wheels)
//! internally.

use std::time::Duration;

/// Work scheduled to run once when a timer elapses.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Schedules single-shot deferred work.
///
/// Implementations must run `task` as an independent turn of the host's
/// event loop: never synchronously inside `schedule_once`, and never while
/// the caller is still executing.
#[cfg_attr(test, mockall::automock)]
pub trait TimerScheduler: Send + Sync {
    /// Run `task` once after `delay` has elapsed.
    ///
    /// The returned handle cancels the task if it has not run yet.
    fn schedule_once(&self, delay: Duration, task: TimerTask) -> Box<dyn TimerHandle>;
}

/// Handle to a scheduled timer.
///
/// Dropping a handle does not cancel the timer; cancellation is always
/// explicit.
pub trait TimerHandle: Send {
    /// Prevent the timer from firing. A no-op if it already fired.
    fn cancel(self: Box<Self>);
}

/// A timer handle with nothing to cancel.
///
/// Useful for schedulers that track cancellation elsewhere, and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedTimer;

impl TimerHandle for DetachedTimer {
    fn cancel(self: Box<Self>) {
        // Intentionally do nothing
    }
}

//! Deterministic clock and timer scheduler.
//!
//! `VirtualTime` implements both [`Clock`] and [`TimerScheduler`] over a clock
//! that only moves when told to. Time stands still between calls to
//! [`VirtualTime::advance`], so a sequence of calls can be replayed exactly.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use throttle_core::{ThrottleGate, VirtualTime};
//!
//! let time = Arc::new(VirtualTime::new());
//! let gate = ThrottleGate::new(
//!     |value: u32| println!("fired {value}"),
//!     Duration::from_millis(100),
//!     time.clone(),
//!     time.clone(),
//! );
//!
//! gate.invoke(1).unwrap(); // runs now
//! gate.invoke(2).unwrap(); // deferred
//! time.advance(Duration::from_millis(100)); // deferred call fires with 2
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::ports::{Clock, TimerHandle, TimerScheduler, TimerTask};

/// Timers keyed by (deadline, insertion sequence) so equal deadlines fire in
/// scheduling order.
type TimerQueue = BTreeMap<(Duration, u64), TimerTask>;

#[derive(Default)]
struct VirtualState {
    /// Time elapsed since `origin`.
    elapsed: Duration,
    next_seq: u64,
    timers: TimerQueue,
}

/// Manually advanced clock and single-shot timer queue.
pub struct VirtualTime {
    origin: Instant,
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualTime {
    /// Create a virtual clock starting at the current real instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Arc::new(Mutex::new(VirtualState::default())),
        }
    }

    /// Time elapsed on this clock since it was created.
    pub fn elapsed(&self) -> Duration {
        lock(&self.state).elapsed
    }

    /// Number of timers that have been scheduled and not yet fired or cancelled.
    pub fn pending_timers(&self) -> usize {
        lock(&self.state).timers.len()
    }

    /// Move the clock forward by `by`, firing every timer that falls due.
    ///
    /// Each timer fires with the clock set to its own deadline. Timers
    /// scheduled by a firing task are honoured if they fall inside the window.
    pub fn advance(&self, by: Duration) {
        let target = lock(&self.state).elapsed + by;
        while let Some(task) = self.pop_due(target) {
            task();
        }
        let mut state = lock(&self.state);
        if state.elapsed < target {
            state.elapsed = target;
        }
    }

    /// Fire every outstanding timer, advancing the clock to each deadline.
    ///
    /// Returns the number of timers fired.
    pub fn run_all(&self) -> usize {
        let mut fired = 0;
        while let Some(task) = self.pop_due(Duration::MAX) {
            task();
            fired += 1;
        }
        fired
    }

    /// Remove the earliest timer due at or before `target` and move the
    /// clock to its deadline. The lock is released before the task runs.
    fn pop_due(&self, target: Duration) -> Option<TimerTask> {
        let mut state = lock(&self.state);
        let (&(deadline, seq), _) = state.timers.first_key_value()?;
        if deadline > target {
            return None;
        }
        let task = state.timers.remove(&(deadline, seq))?;
        if state.elapsed < deadline {
            state.elapsed = deadline;
        }
        trace!(deadline_ms = deadline.as_millis(), seq, "Firing virtual timer");
        Some(task)
    }
}

impl Default for VirtualTime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VirtualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("VirtualTime")
            .field("elapsed", &state.elapsed)
            .field("pending_timers", &state.timers.len())
            .finish()
    }
}

impl Clock for VirtualTime {
    fn now(&self) -> Instant {
        self.origin + lock(&self.state).elapsed
    }
}

impl TimerScheduler for VirtualTime {
    fn schedule_once(&self, delay: Duration, task: TimerTask) -> Box<dyn TimerHandle> {
        let mut state = lock(&self.state);
        let key = (state.elapsed + delay, state.next_seq);
        state.next_seq += 1;
        state.timers.insert(key, task);
        Box::new(VirtualTimer {
            key,
            state: Arc::clone(&self.state),
        })
    }
}

/// Handle to a timer in a [`VirtualTime`] queue.
struct VirtualTimer {
    key: (Duration, u64),
    state: Arc<Mutex<VirtualState>>,
}

impl TimerHandle for VirtualTimer {
    fn cancel(self: Box<Self>) {
        lock(&self.state).timers.remove(&self.key);
    }
}

fn lock(state: &Mutex<VirtualState>) -> MutexGuard<'_, VirtualState> {
    state
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

//! Tokio-based timer scheduler.
//!
//! Each deferred run is a spawned task that sleeps and then calls into the
//! gate. Cancelling aborts the task. Panics from the action are logged and
//! re-raised so they surface through the task's `JoinError`.

use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::time::Duration;

use throttle_core::{TimerHandle, TimerScheduler, TimerTask};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{error, trace};

use crate::error::RuntimeError;

/// Schedule timers onto a Tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Bind to an explicit runtime handle.
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Bind to the runtime running on the calling thread.
    pub fn current() -> Result<Self, RuntimeError> {
        Ok(Self::new(Handle::try_current()?))
    }
}

impl TimerScheduler for TokioScheduler {
    fn schedule_once(&self, delay: Duration, task: TimerTask) -> Box<dyn TimerHandle> {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(panic) = catch_unwind(AssertUnwindSafe(task)) {
                error!("Deferred throttled action panicked");
                resume_unwind(panic);
            }
        });
        trace!(delay_ms = delay.as_millis(), "Spawned timer task");
        Box::new(TokioTimer {
            abort: join.abort_handle(),
        })
    }
}

/// Handle to a spawned timer task.
#[derive(Debug)]
pub struct TokioTimer {
    abort: AbortHandle,
}

impl TimerHandle for TokioTimer {
    fn cancel(self: Box<Self>) {
        self.abort.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(counter: &Arc<AtomicUsize>) -> TimerTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_runs_after_delay() {
        let scheduler = TokioScheduler::current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let _timer = scheduler.schedule_once(Duration::from_millis(200), counting_task(&fired));

        tokio::time::sleep(Duration::from_millis(199)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_task_never_runs() {
        let scheduler = TokioScheduler::current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let timer = scheduler.schedule_once(Duration::from_millis(50), counting_task(&fired));
        timer.cancel();

        tokio::time::sleep(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_current_outside_runtime_fails() {
        assert!(matches!(
            TokioScheduler::current(),
            Err(RuntimeError::NoRuntime(_))
        ));
    }
}

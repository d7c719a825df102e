//! Binding a gate to its owner's lifecycle.
//!
//! Hosts signal "this component is being destroyed" by cancelling a
//! `CancellationToken`. The bound task disposes the gate exactly once when
//! that happens, so no deferred run can fire into a torn-down owner.

use std::sync::Arc;
use std::time::Duration;

use throttle_core::ThrottleGate;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::clock::TokioClock;
use crate::error::RuntimeError;
use crate::scheduler::TokioScheduler;

/// Dispose `gate` when `token` is cancelled.
///
/// The returned task finishes right after disposal. Aborting it unbinds the
/// gate without disposing it.
pub fn bind_to_lifecycle<A>(
    gate: Arc<ThrottleGate<A>>,
    token: CancellationToken,
) -> Result<JoinHandle<()>, RuntimeError>
where
    A: Send + 'static,
{
    let handle = Handle::try_current()?;
    Ok(handle.spawn(async move {
        token.cancelled().await;
        debug!("Owner torn down, disposing throttle gate");
        gate.dispose();
    }))
}

/// Build a gate that runs on the current Tokio runtime.
pub fn throttle_on_current<A, F>(action: F, interval: Duration) -> Result<ThrottleGate<A>, RuntimeError>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    let scheduler = TokioScheduler::current()?;
    Ok(ThrottleGate::new(
        action,
        interval,
        Arc::new(TokioClock::new()),
        Arc::new(scheduler),
    ))
}

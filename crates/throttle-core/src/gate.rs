//! The throttle gate state machine.
//!
//! A gate wraps an action and an interval. Each call either runs the action
//! now (leading edge), schedules a single deferred run for the end of the
//! current window (trailing edge), or folds its arguments into the run that
//! is already scheduled. States are `Idle` and `Pending`, plus the terminal
//! disposed state.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::GateError;
use crate::ports::{Clock, TimerHandle, TimerScheduler};
use crate::settings::ThrottleSettings;

/// Shared reference to the throttled action.
pub type Action<A> = Arc<dyn Fn(A) + Send + Sync + 'static>;

/// What a single call to [`ThrottleGate::invoke`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The action ran synchronously with this call's arguments.
    Executed,
    /// A deferred run was scheduled to fire after `remaining`.
    Scheduled {
        /// Time left in the current window when the call arrived.
        remaining: Duration,
    },
    /// A deferred run was already pending; its arguments were replaced.
    Coalesced,
}

/// The single deferred run a gate may have outstanding.
struct PendingFire<A> {
    id: u64,
    args: A,
    /// `None` while the timer is being registered with the scheduler.
    timer: Option<Box<dyn TimerHandle>>,
}

struct GateState<A> {
    action: Action<A>,
    interval: Duration,
    last_fire: Option<Instant>,
    pending: Option<PendingFire<A>>,
    next_timer_id: u64,
    disposed: bool,
}

struct GateInner<A> {
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn TimerScheduler>,
    state: Mutex<GateState<A>>,
}

/// Throttles an action to at most one execution per interval.
///
/// The first call after an idle period runs immediately. Calls arriving
/// inside the interval collapse into one deferred run at the end of the
/// window, which uses the arguments of the most recent call and whatever
/// action is current when it fires.
///
/// The owning context must call [`dispose`](Self::dispose) when it ends.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use throttle_core::{Dispatch, ThrottleGate, VirtualTime};
///
/// let time = Arc::new(VirtualTime::new());
/// let gate = ThrottleGate::new(
///     |query: String| println!("search: {query}"),
///     Duration::from_millis(500),
///     time.clone(),
///     time.clone(),
/// );
/// let search = gate.invoker();
///
/// assert_eq!(search.call("r".into()), Ok(Dispatch::Executed));
/// assert!(matches!(search.call("ru".into()), Ok(Dispatch::Scheduled { .. })));
/// assert_eq!(search.call("rus".into()), Ok(Dispatch::Coalesced));
///
/// time.advance(Duration::from_millis(500)); // prints "search: rus"
/// gate.dispose();
/// ```
pub struct ThrottleGate<A> {
    inner: Arc<GateInner<A>>,
}

impl<A: Send + 'static> ThrottleGate<A> {
    /// Create a gate around `action` with the given minimum spacing.
    ///
    /// A zero interval turns every call into a leading-edge execution.
    pub fn new<F>(
        action: F,
        interval: Duration,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn TimerScheduler>,
    ) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::with_action(Arc::new(action), interval, clock, scheduler)
    }

    /// Create a gate from an already shared action reference.
    pub fn with_action(
        action: Action<A>,
        interval: Duration,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn TimerScheduler>,
    ) -> Self {
        Self {
            inner: Arc::new(GateInner {
                clock,
                scheduler,
                state: Mutex::new(GateState {
                    action,
                    interval,
                    last_fire: None,
                    pending: None,
                    next_timer_id: 0,
                    disposed: false,
                }),
            }),
        }
    }

    /// Create a gate from unvalidated settings.
    ///
    /// Fails with [`GateError::InvalidConfiguration`] for a negative interval.
    pub fn from_settings<F>(
        action: F,
        settings: &ThrottleSettings,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn TimerScheduler>,
    ) -> Result<Self, GateError>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let interval = settings.interval()?;
        Ok(Self::new(action, interval, clock, scheduler))
    }

    /// Return the bound entry point handed to callers.
    pub fn invoker(&self) -> ThrottledFn<A> {
        ThrottledFn {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Call the throttled action with `args`.
    pub fn invoke(&self, args: A) -> Result<Dispatch, GateError> {
        GateInner::invoke(&self.inner, args)
    }

    /// Replace the action without touching any timing state.
    ///
    /// A deferred run that is already scheduled will use the new action.
    pub fn update_action<F>(&self, action: F)
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        self.inner.lock().action = Arc::new(action);
    }

    /// Change the minimum spacing.
    ///
    /// The new value applies from the next call on; a deferred run that is
    /// already scheduled keeps its fire time.
    pub fn set_interval(&self, interval: Duration) {
        let mut state = self.inner.lock();
        debug!(
            old_ms = state.interval.as_millis(),
            new_ms = interval.as_millis(),
            "Throttle interval changed"
        );
        state.interval = interval;
    }

    /// Current minimum spacing.
    pub fn interval(&self) -> Duration {
        self.inner.lock().interval
    }

    /// Whether a deferred run is scheduled.
    pub fn is_pending(&self) -> bool {
        self.inner.lock().pending.is_some()
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.inner.lock().disposed
    }

    /// Cancel any deferred run and stop accepting calls.
    ///
    /// The pending arguments are dropped without running the action.
    /// Calling this more than once is a no-op.
    pub fn dispose(&self) {
        let pending = {
            let mut state = self.inner.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.pending.take()
        };

        match pending {
            Some(fire) => {
                debug!(timer_id = fire.id, "Disposing throttle gate, cancelling deferred run");
                if let Some(timer) = fire.timer {
                    timer.cancel();
                }
            }
            None => debug!("Disposing idle throttle gate"),
        }
    }
}

impl<A> fmt::Debug for ThrottleGate<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("ThrottleGate")
            .field("interval", &state.interval)
            .field("last_fire", &state.last_fire)
            .field("pending", &state.pending.as_ref().map(|p| p.id))
            .field("disposed", &state.disposed)
            .finish_non_exhaustive()
    }
}

/// Cloneable entry point into a [`ThrottleGate`].
///
/// This is the wrapped callback external callers hold. It shares state with
/// the gate it came from, so disposing the gate disables every clone.
pub struct ThrottledFn<A> {
    inner: Arc<GateInner<A>>,
}

impl<A: Send + 'static> ThrottledFn<A> {
    /// Call the throttled action with `args`.
    pub fn call(&self, args: A) -> Result<Dispatch, GateError> {
        GateInner::invoke(&self.inner, args)
    }
}

impl<A> Clone for ThrottledFn<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for ThrottledFn<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottledFn").finish_non_exhaustive()
    }
}

impl<A> GateInner<A> {
    fn lock(&self) -> MutexGuard<'_, GateState<A>> {
        // The action never runs under this lock, so poisoning can only come
        // from a panic in the gate itself; the state is still coherent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Send + 'static> GateInner<A> {
    fn invoke(this: &Arc<Self>, args: A) -> Result<Dispatch, GateError> {
        let mut state = this.lock();
        if state.disposed {
            return Err(GateError::Disposed);
        }

        // Read under the lock so `last_fire` only ever moves forward.
        let now = this.clock.now();
        let elapsed = state
            .last_fire
            .map(|last| now.saturating_duration_since(last));

        // Leading edge: never fired, or a full interval has passed.
        if elapsed.is_none_or(|elapsed| elapsed >= state.interval) {
            state.last_fire = Some(now);
            // A timer that is late past its deadline still holds older
            // arguments; this call supersedes it.
            let superseded = state.pending.take();
            let action = Arc::clone(&state.action);
            drop(state);

            if let Some(fire) = superseded {
                debug!(timer_id = fire.id, "Leading call supersedes late deferred run");
                if let Some(timer) = fire.timer {
                    timer.cancel();
                }
            }
            trace!(elapsed_ms = ?elapsed.map(|e| e.as_millis()), "Executing on leading edge");
            action(args);
            return Ok(Dispatch::Executed);
        }

        if let Some(pending) = state.pending.as_mut() {
            trace!(timer_id = pending.id, "Coalescing into pending run");
            pending.args = args;
            return Ok(Dispatch::Coalesced);
        }

        let elapsed = elapsed.unwrap_or_default();
        let remaining = state.interval.saturating_sub(elapsed);
        let id = state.next_timer_id;
        state.next_timer_id += 1;
        state.pending = Some(PendingFire {
            id,
            args,
            timer: None,
        });
        drop(state);

        debug!(
            timer_id = id,
            elapsed_ms = elapsed.as_millis(),
            remaining_ms = remaining.as_millis(),
            "Scheduling trailing run"
        );
        let weak = Arc::downgrade(this);
        let timer = this
            .scheduler
            .schedule_once(remaining, Box::new(move || Self::fire(&weak, id)));
        this.attach_timer(id, timer);

        Ok(Dispatch::Scheduled { remaining })
    }

    /// Store the scheduler's handle on the pending entry it belongs to.
    ///
    /// If the entry is gone (disposed, or the timer already fired) the handle
    /// is cancelled instead.
    fn attach_timer(&self, id: u64, timer: Box<dyn TimerHandle>) {
        let mut state = self.lock();
        match state.pending.as_mut() {
            Some(pending) if pending.id == id => pending.timer = Some(timer),
            _ => {
                drop(state);
                timer.cancel();
            }
        }
    }

    fn fire(weak: &Weak<Self>, id: u64) {
        let Some(this) = weak.upgrade() else {
            trace!(timer_id = id, "Gate dropped before deferred run");
            return;
        };

        let (action, args) = {
            let mut state = this.lock();
            let now = this.clock.now();
            let Some(pending) = state.pending.take_if(|pending| pending.id == id) else {
                trace!(timer_id = id, "Ignoring stale timer");
                return;
            };
            state.last_fire = Some(now);
            (Arc::clone(&state.action), pending.args)
        };

        debug!(timer_id = id, "Executing deferred run");
        action(args);
    }
}

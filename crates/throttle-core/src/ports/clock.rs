//! Monotonic clock port.
//!
//! The gate never reads time directly; the host supplies a clock so that
//! production code can use the runtime's timer while tests drive a virtual one.

use std::time::Instant;

/// Source of monotonic time readings.
///
/// # Implementations
///
/// - `VirtualTime` - deterministic, manually advanced clock
/// - Adapter-specific implementations (`TokioClock` in `throttle-runtime`)
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Returns the current instant. Successive readings never go backwards.
    fn now(&self) -> Instant;
}

//! Tokio-backed clock.

use std::time::Instant;

use throttle_core::Clock;

/// Reads `tokio::time::Instant`, so a paused test runtime controls it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl TokioClock {
    /// Create a new Tokio clock.
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

//! Port definitions (trait abstractions) for host capabilities.
//!
//! Ports define the interfaces that the gate expects from its host
//! environment. They contain no runtime details and use only std types.
//!
//! # Design Rules
//!
//! - No Tokio types in any signature
//! - Time is always read through [`Clock`], never `Instant::now()` directly
//! - Deferred work is always scheduled through [`TimerScheduler`]

pub mod clock;
pub mod timer;

pub use clock::Clock;
pub use timer::{DetachedTimer, TimerHandle, TimerScheduler, TimerTask};

#[cfg(test)]
pub use clock::MockClock;
#[cfg(test)]
pub use timer::MockTimerScheduler;

//! Tokio adapters for the throttle gate.
//!
//! Implements the `throttle-core` ports on top of Tokio and wires a gate's
//! teardown to a `CancellationToken` supplied by the owning component.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod clock;
mod error;
pub mod lifecycle;
mod scheduler;

pub use clock::TokioClock;
pub use error::RuntimeError;
pub use lifecycle::{bind_to_lifecycle, throttle_on_current};
pub use scheduler::{TokioScheduler, TokioTimer};

// Silence unused dev-dependency warnings; integration tests use it
#[cfg(test)]
use tokio_test as _;

//! Runtime adapter errors.

use throttle_core::GateError;
use thiserror::Error;

/// Errors raised while wiring a gate to the Tokio runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// No Tokio runtime is running on the calling thread.
    #[error("No Tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// Gate construction or use failed.
    #[error(transparent)]
    Gate(#[from] GateError),
}

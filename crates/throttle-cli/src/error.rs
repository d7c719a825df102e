//! CLI-specific error types and mappings.
//!
//! This module provides error types for the CLI adapter and mappings
//! from gate and runtime errors to exit codes and user-facing messages.

use thiserror::Error;
use throttle_core::GateError;
use throttle_runtime::RuntimeError;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Gate or runtime failure.
    #[error("{0}")]
    Core(String),

    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<GateError> for CliError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::InvalidConfiguration(msg) => Self::Config(msg),
            GateError::Disposed => Self::Core(err.to_string()),
        }
    }
}

impl From<RuntimeError> for CliError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Gate(gate_err) => gate_err.into(),
            RuntimeError::NoRuntime(_) => Self::Core(err.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Arguments(format!("malformed call script: {err}"))
    }
}

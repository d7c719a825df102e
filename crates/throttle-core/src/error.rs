//! Gate error types.

use thiserror::Error;

use crate::settings::SettingsError;

/// Errors surfaced by [`ThrottleGate`](crate::ThrottleGate).
///
/// The gate performs no I/O, so the only failures are misuse: a bad
/// configuration at construction time, or a call after teardown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// The gate was configured with values it cannot honour.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The gate has been disposed and no longer accepts calls.
    #[error("Throttle gate has been disposed")]
    Disposed,
}

impl From<SettingsError> for GateError {
    fn from(err: SettingsError) -> Self {
        Self::InvalidConfiguration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_error_maps_to_invalid_configuration() {
        let err: GateError = SettingsError::NegativeInterval(-5).into();
        assert!(matches!(err, GateError::InvalidConfiguration(ref msg) if msg.contains("-5")));
    }

    #[test]
    fn test_disposed_message() {
        assert_eq!(
            GateError::Disposed.to_string(),
            "Throttle gate has been disposed"
        );
    }
}

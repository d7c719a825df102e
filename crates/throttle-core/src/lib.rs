//! Leading/trailing-edge throttling for UI callbacks.
//!
//! [`ThrottleGate`] wraps an action so that it runs at most once per interval.
//! The first call in a burst runs immediately; later calls inside the window
//! collapse into a single deferred run that uses the newest arguments and the
//! newest action.
//!
//! The gate never touches a runtime directly. Time and deferred execution come
//! from the [`ports::Clock`] and [`ports::TimerScheduler`] ports, implemented
//! for Tokio in `throttle-runtime` and deterministically by [`VirtualTime`].
#![deny(unused_crate_dependencies)]

pub mod error;
pub mod gate;
pub mod ports;
pub mod settings;
pub mod virtual_time;

pub use error::GateError;
pub use gate::{Action, Dispatch, ThrottleGate, ThrottledFn};
pub use ports::{Clock, DetachedTimer, TimerHandle, TimerScheduler, TimerTask};
pub use settings::{DEFAULT_INTERVAL_MS, SettingsError, ThrottleSettings, validate_settings};
pub use virtual_time::VirtualTime;

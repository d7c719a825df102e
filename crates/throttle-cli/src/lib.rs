//! Command-line front end for throttle gates.
//!
//! `simulate` replays scripted calls on a virtual clock; `live` runs a gate on
//! the Tokio clock.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Dependencies used only by main.rs
use dotenvy as _;
use tracing_subscriber as _;

pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod script;

// Re-export primary types for convenient access
pub use commands::{Commands, INTERVAL_ENV};
pub use error::CliError;
pub use parser::Cli;

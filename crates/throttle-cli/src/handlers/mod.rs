//! Command handlers.
//!
//! Handlers are thin wrappers that:
//!   1. Validate CLI-specific input
//!   2. Build a gate through `throttle-core` / `throttle-runtime`
//!   3. Format output for the terminal

pub mod live;
pub mod simulate;

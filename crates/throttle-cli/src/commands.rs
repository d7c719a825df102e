//! Main commands enum.

use std::path::PathBuf;

use clap::Subcommand;

/// Environment variable that supplies the default interval.
pub const INTERVAL_ENV: &str = "THROTTLE_INTERVAL_MS";

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scripted call sequence on a virtual clock
    Simulate {
        /// Minimum spacing between executions, in milliseconds
        #[arg(long, env = INTERVAL_ENV, default_value_t = 1000, allow_hyphen_values = true)]
        interval_ms: i64,
        /// Calls as comma-separated `<at_ms>:<arg>` pairs (e.g. "0:A,0:B,300:C")
        #[arg(long, conflicts_with = "calls_file")]
        calls: Option<String>,
        /// JSON file holding `[{"at_ms": 0, "arg": "A"}, ...]`
        #[arg(long)]
        calls_file: Option<PathBuf>,
        /// Tear the gate down at this time
        #[arg(long)]
        dispose_at: Option<u64>,
        /// Swap in a new action at this time
        #[arg(long)]
        update_action_at: Option<u64>,
    },

    /// Fire calls against a gate on the real Tokio clock
    Live {
        /// Minimum spacing between executions, in milliseconds
        #[arg(long, env = INTERVAL_ENV, default_value_t = 1000, allow_hyphen_values = true)]
        interval_ms: i64,
        /// Number of calls to make
        #[arg(long, default_value_t = 10)]
        count: u32,
        /// Delay between consecutive calls, in milliseconds
        #[arg(long, default_value_t = 100)]
        spacing_ms: u64,
    },
}

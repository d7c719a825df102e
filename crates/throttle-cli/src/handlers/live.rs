//! Live command handler.
//!
//! Drives a gate on the real Tokio clock. Ctrl+C tears the gate down through
//! the same cancellation token a host component would cancel on unmount.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use throttle_core::{Dispatch, ThrottleGate, ThrottleSettings};
use throttle_runtime::{bind_to_lifecycle, throttle_on_current};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CliError;

/// Options for a live run.
#[derive(Debug, Clone, Copy)]
pub struct LiveArgs {
    pub interval_ms: i64,
    pub count: u32,
    pub spacing_ms: u64,
}

/// Validate the signed interval taken from flags or the environment.
pub fn live_interval(interval_ms: i64) -> Result<Duration, CliError> {
    ThrottleSettings::with_interval_ms(interval_ms)
        .interval()
        .map_err(|e| CliError::Config(e.to_string()))
}

/// Feed `count` numbered calls into `gate`, `spacing` apart.
///
/// Waits one more `interval` at the end so the trailing run can fire.
/// Returns how many calls were folded into an already pending run.
pub async fn drive_calls(
    gate: &ThrottleGate<u32>,
    count: u32,
    spacing: Duration,
    interval: Duration,
) -> Result<usize, CliError> {
    let mut coalesced = 0;
    for call in 1..=count {
        if gate.invoke(call)? == Dispatch::Coalesced {
            coalesced += 1;
        }
        tokio::time::sleep(spacing).await;
    }
    tokio::time::sleep(interval).await;
    Ok(coalesced)
}

/// Execute the live command.
pub async fn execute(args: LiveArgs) -> Result<()> {
    let interval = live_interval(args.interval_ms)?;
    let spacing = Duration::from_millis(args.spacing_ms);

    let started = Instant::now();
    let gate = Arc::new(
        throttle_on_current(
            move |call: u32| {
                println!("t={} call #{call}", started.elapsed().as_millis());
            },
            interval,
        )
        .map_err(CliError::from)?,
    );

    let token = CancellationToken::new();
    let binding = bind_to_lifecycle(Arc::clone(&gate), token.clone()).map_err(CliError::from)?;

    info!(
        interval_ms = interval.as_millis(),
        count = args.count,
        spacing_ms = args.spacing_ms,
        "Starting live run"
    );

    tokio::select! {
        result = drive_calls(&gate, args.count, spacing, interval) => {
            let coalesced = result?;
            println!("{} calls, {coalesced} coalesced", args.count);
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, tearing down gate");
        }
    }

    token.cancel();
    binding.await?;
    Ok(())
}

//! Simulate command handler.
//!
//! Replays a call script against a gate on [`VirtualTime`], so the output is
//! identical on every run regardless of machine load.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use throttle_core::{Dispatch, GateError, ThrottleGate, ThrottleSettings, VirtualTime};
use tracing::debug;

use crate::error::CliError;
use crate::script::ScriptedCall;

/// Everything needed to replay a scenario.
#[derive(Debug, Clone, Default)]
pub struct SimulationPlan {
    pub interval_ms: i64,
    pub calls: Vec<ScriptedCall>,
    pub dispose_at: Option<u64>,
    pub update_action_at: Option<u64>,
}

/// Which edge of the window produced an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Leading,
    Trailing,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leading => write!(f, "leading"),
            Self::Trailing => write!(f, "trailing"),
        }
    }
}

/// One run of the throttled action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub at_ms: u64,
    pub edge: Edge,
    pub arg: String,
    /// Starts at 1 and increments on every action swap.
    pub action_version: u32,
}

impl fmt::Display for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={} {} {}", self.at_ms, self.edge, self.arg)?;
        if self.action_version > 1 {
            write!(f, " (action v{})", self.action_version)?;
        }
        Ok(())
    }
}

/// Outcome of a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationReport {
    pub executions: Vec<Execution>,
    /// Calls made after the gate was disposed.
    pub rejected: Vec<ScriptedCall>,
    /// Calls folded into an already pending run.
    pub coalesced: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Step {
    UpdateAction,
    Call(usize),
    Dispose,
}

type Executions = Arc<Mutex<Vec<Execution>>>;

fn recording_action(
    time: &Arc<VirtualTime>,
    executions: &Executions,
    version: u32,
) -> impl Fn(String) + Send + Sync + 'static {
    let time = Arc::clone(time);
    let executions = Arc::clone(executions);
    move |arg| {
        let at_ms = u64::try_from(time.elapsed().as_millis()).unwrap_or(u64::MAX);
        // Leading runs are re-tagged by the caller once invoke returns.
        lock(&executions).push(Execution {
            at_ms,
            edge: Edge::Trailing,
            arg,
            action_version: version,
        });
    }
}

fn lock(executions: &Executions) -> std::sync::MutexGuard<'_, Vec<Execution>> {
    executions
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Replay `plan` and collect what the action observed.
///
/// Steps sharing a timestamp run as: action swap, calls in script order,
/// then disposal. Every outstanding timer is drained at the end.
pub fn run(plan: &SimulationPlan) -> Result<SimulationReport, CliError> {
    let time = Arc::new(VirtualTime::new());
    let executions: Executions = Arc::new(Mutex::new(Vec::new()));
    let mut version = 1;

    let gate = ThrottleGate::from_settings(
        recording_action(&time, &executions, version),
        &ThrottleSettings::with_interval_ms(plan.interval_ms),
        time.clone(),
        time.clone(),
    )?;

    let mut steps: Vec<(u64, Step)> = plan
        .calls
        .iter()
        .enumerate()
        .map(|(index, call)| (call.at_ms, Step::Call(index)))
        .collect();
    if let Some(at) = plan.update_action_at {
        steps.push((at, Step::UpdateAction));
    }
    if let Some(at) = plan.dispose_at {
        steps.push((at, Step::Dispose));
    }
    steps.sort();

    let mut report = SimulationReport::default();
    let mut now_ms = 0;
    for (at_ms, step) in steps {
        time.advance(Duration::from_millis(at_ms - now_ms));
        now_ms = at_ms;

        match step {
            Step::UpdateAction => {
                version += 1;
                debug!(at_ms, version, "Swapping action");
                gate.update_action(recording_action(&time, &executions, version));
            }
            Step::Dispose => {
                debug!(at_ms, "Disposing gate");
                gate.dispose();
            }
            Step::Call(index) => {
                let call = &plan.calls[index];
                match gate.invoke(call.arg.clone()) {
                    Ok(Dispatch::Executed) => {
                        if let Some(last) = lock(&executions).last_mut() {
                            last.edge = Edge::Leading;
                        }
                    }
                    Ok(Dispatch::Scheduled { .. }) => {}
                    Ok(Dispatch::Coalesced) => report.coalesced += 1,
                    Err(GateError::Disposed) => report.rejected.push(call.clone()),
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }
    time.run_all();
    gate.dispose();

    report.executions = lock(&executions).clone();
    Ok(report)
}

/// Execute the simulate command and print the execution log.
pub fn execute(plan: &SimulationPlan) -> Result<()> {
    let report = run(plan)?;

    for execution in &report.executions {
        println!("{execution}");
    }
    for call in &report.rejected {
        println!("t={} rejected {} (gate disposed)", call.at_ms, call.arg);
    }
    println!(
        "{} calls, {} executions, {} coalesced",
        plan.calls.len(),
        report.executions.len(),
        report.coalesced
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse_inline;
    use tokio_test::{assert_err, assert_ok};

    fn plan(interval_ms: i64, calls: &str) -> SimulationPlan {
        SimulationPlan {
            interval_ms,
            calls: parse_inline(calls).unwrap(),
            ..SimulationPlan::default()
        }
    }

    fn summary(report: &SimulationReport) -> Vec<String> {
        report.executions.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_rapid_calls_leading_then_trailing() {
        let report = assert_ok!(run(&plan(1000, "0:A,0:B")));
        assert_eq!(summary(&report), vec!["t=0 leading A", "t=1000 trailing B"]);
    }

    #[test]
    fn test_trailing_run_waits_for_rest_of_window() {
        let report = assert_ok!(run(&plan(500, "0:A,300:B")));
        assert_eq!(summary(&report), vec!["t=0 leading A", "t=500 trailing B"]);
    }

    #[test]
    fn test_burst_keeps_last_argument() {
        let report = assert_ok!(run(&plan(1000, "0:a1,100:a2,200:a3,900:a4")));
        assert_eq!(summary(&report), vec!["t=0 leading a1", "t=1000 trailing a4"]);
        assert_eq!(report.coalesced, 2);
    }

    #[test]
    fn test_dispose_drops_pending_and_rejects_later_calls() {
        let mut plan = plan(1000, "0:A,0:B,2000:C");
        plan.dispose_at = Some(10);

        let report = assert_ok!(run(&plan));
        assert_eq!(summary(&report), vec!["t=0 leading A"]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].arg, "C");
    }

    #[test]
    fn test_action_swap_applies_to_pending_run() {
        let mut plan = plan(1000, "0:A,0:B");
        plan.update_action_at = Some(500);

        let report = assert_ok!(run(&plan));
        assert_eq!(
            summary(&report),
            vec!["t=0 leading A", "t=1000 trailing B (action v2)"]
        );
    }

    #[test]
    fn test_zero_interval_runs_everything_on_leading_edge() {
        let report = assert_ok!(run(&plan(0, "0:A,0:B,0:C")));
        assert!(report.executions.iter().all(|e| e.edge == Edge::Leading));
        assert_eq!(report.executions.len(), 3);
    }

    #[test]
    fn test_negative_interval_is_configuration_error() {
        let err = assert_err!(run(&plan(-100, "0:A")));
        assert!(matches!(err, CliError::Config(_)));
    }
}

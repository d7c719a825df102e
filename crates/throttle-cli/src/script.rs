//! Call scripts for the `simulate` command.
//!
//! A script is a list of `(at_ms, arg)` calls, given inline as
//! `"0:A,0:B,300:C"` or as a JSON array of objects.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// One scripted call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedCall {
    /// Virtual time of the call, in milliseconds from the start.
    pub at_ms: u64,
    /// Argument passed to the throttled action.
    pub arg: String,
}

/// Parse the inline `<at_ms>:<arg>` form.
pub fn parse_inline(script: &str) -> Result<Vec<ScriptedCall>, CliError> {
    script.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (at, arg) = entry.split_once(':').ok_or_else(|| {
                CliError::Arguments(format!("expected <at_ms>:<arg>, got '{entry}'"))
            })?;
            let at_ms = at.trim().parse::<u64>().map_err(|e| {
                CliError::Arguments(format!("invalid call time '{at}': {e}"))
            })?;
            Ok(ScriptedCall {
                at_ms,
                arg: arg.trim().to_string(),
            })
        })
        .collect()
}

/// Load a JSON call script from disk.
pub fn load_file(path: &Path) -> Result<Vec<ScriptedCall>, CliError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

//! Shared helpers for command handlers.

use std::io::{self, IsTerminal};

use hivefleet_core::{CommandOutcome, SkipReason, WorkerKey};

use crate::cli::WorkerRef;
use crate::error::CliError;

impl From<WorkerRef> for WorkerKey {
    fn from(r: WorkerRef) -> Self {
        WorkerKey::new(r.farm, r.worker)
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` is required.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(io::Error::other(e)))
}

/// One status line for a switch action, for stderr.
pub fn describe_outcome(action: &str, target: &str, outcome: CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Sent => format!("✓ {action} sent to {target}"),
        CommandOutcome::Skipped(reason) => {
            let why = match reason {
                SkipReason::AlreadyOn => "miner is already running",
                SkipReason::AlreadyOff => "miner is already stopped",
                SkipReason::Unavailable => "worker is offline or has no GPUs",
                SkipReason::UpToDate => "no upgrade pending",
            };
            format!("- {action} skipped for {target}: {why}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_outcome_explains_itself() {
        let line = describe_outcome(
            "upgrade",
            "rig1 (1/2)",
            CommandOutcome::Skipped(SkipReason::UpToDate),
        );

        assert_eq!(line, "- upgrade skipped for rig1 (1/2): no upgrade pending");
    }

    #[test]
    fn yes_flag_skips_the_prompt() {
        assert!(confirm("Reboot?", "reboot", true).unwrap_or(false));
    }
}

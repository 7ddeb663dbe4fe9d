// src/power.rs

//! AC power detection.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::errors::PowerError;
use crate::exec::RunContext;
use crate::types::BoxFuture;

/// Marker printed by the power status command when running on mains power.
pub const AC_POWER_MARKER: &str = "AC Power";

/// Source of truth for the host's power state.
pub trait PowerSource: Send + Sync {
    fn is_on_ac_power<'a>(&'a self, ctx: &'a RunContext) -> BoxFuture<'a, Result<bool, PowerError>>;
}

/// Case-sensitive scan of the status command output.
pub fn reports_ac_power(output: &str) -> bool {
    output.contains(AC_POWER_MARKER)
}

/// Power source backed by an external status command (`pmset -g ps` by
/// default).
#[derive(Debug, Clone)]
pub struct CommandPowerSource {
    program: String,
    args: Vec<String>,
}

impl CommandPowerSource {
    /// `command` is the program followed by its arguments.
    pub fn new(command: &[String]) -> Self {
        let (program, args) = match command.split_first() {
            Some((program, args)) => (program.clone(), args.to_vec()),
            None => (String::new(), Vec::new()),
        };
        Self { program, args }
    }

    async fn query(&self, ctx: &RunContext) -> Result<bool, PowerError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout_at(ctx.deadline(), cmd.output())
            .await
            .map_err(|_| PowerError::Timeout {
                program: self.program.clone(),
            })?
            .map_err(|source| PowerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(PowerError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let on_ac = reports_ac_power(stdout.trim());
        debug!(program = %self.program, on_ac, "power status queried");
        Ok(on_ac)
    }
}

impl PowerSource for CommandPowerSource {
    fn is_on_ac_power<'a>(&'a self, ctx: &'a RunContext) -> BoxFuture<'a, Result<bool, PowerError>> {
        Box::pin(self.query(ctx))
    }
}

// src/backup/retention.rs

//! Retention enforcement via the engine's `forget --prune`.

use tracing::{error, info};

use crate::backup::engine::Engine;
use crate::exec::RunContext;

/// Snapshot keep-rules. The orchestrator always uses [`Default`], so every
/// prune issues the same argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub keep_hourly: u32,
    pub keep_daily: u32,
    pub keep_weekly: u32,
    pub keep_monthly: u32,
    pub keep_yearly: u32,
    /// Snapshots carrying this tag are never removed.
    pub keep_tag: String,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_hourly: 4,
            keep_daily: 7,
            keep_weekly: 5,
            keep_monthly: 12,
            keep_yearly: 5,
            keep_tag: "nodelete".to_string(),
        }
    }
}

impl RetentionPolicy {
    /// Quiet `forget` with pruning enabled.
    pub fn forget_args(&self) -> Vec<String> {
        vec![
            "forget".to_string(),
            "-q".to_string(),
            "--prune".to_string(),
            "--keep-hourly".to_string(),
            self.keep_hourly.to_string(),
            "--keep-daily".to_string(),
            self.keep_daily.to_string(),
            "--keep-weekly".to_string(),
            self.keep_weekly.to_string(),
            "--keep-monthly".to_string(),
            self.keep_monthly.to_string(),
            "--keep-yearly".to_string(),
            self.keep_yearly.to_string(),
            "--keep-tag".to_string(),
            self.keep_tag.clone(),
        ]
    }
}

/// Apply `policy` to the repository. Returns whether the engine succeeded.
///
/// A failure is logged and reported to the caller only; it never fails the
/// run, the backup has already been taken at this point.
pub async fn prune(engine: &Engine<'_>, ctx: &RunContext, policy: &RetentionPolicy) -> bool {
    let result = engine.forget(ctx, policy).await;
    if result.success() {
        info!(cmd = %engine.program().display(), command = "forget", "old snapshots pruned");
        true
    } else {
        error!(
            cmd = %engine.program().display(),
            command = "forget",
            status = %result.status,
            "forget failed"
        );
        false
    }
}

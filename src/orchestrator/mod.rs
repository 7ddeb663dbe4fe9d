// src/orchestrator/mod.rs

//! Run orchestration.
//!
//! This module ties together:
//! - the instance lock
//! - preflight checks (engine executable, power state)
//! - credential setup
//! - the backup and retention engine calls
//! - metrics reporting
//!
//! The sequence lives in [`run`]; [`phase`] names its steps for logging.

pub mod phase;
pub mod run;

use std::time::Duration;

use crate::errors::RunError;
use crate::types::SkipReason;

pub use phase::RunPhase;
pub use run::{Collaborators, Orchestrator};

/// What a completed run did besides the backup itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Time from start to reporting.
    pub duration: Duration,
    /// `None` when cleanup is disabled, otherwise whether the prune succeeded.
    pub pruned: Option<bool>,
    pub metrics_pushed: bool,
}

/// Non-error result of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunReport),
    /// Stopped on purpose before touching the engine.
    Skipped(SkipReason),
}

/// Process exit status for a run result: 0 for completed or skipped runs,
/// 1 for every error.
pub fn exit_status(result: &Result<RunOutcome, RunError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

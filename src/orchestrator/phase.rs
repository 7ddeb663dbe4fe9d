// src/orchestrator/phase.rs

use std::fmt;

/// Steps of a run, in order. `Pruning` only happens with cleanup enabled;
/// `Done` is reached from every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Start,
    Locking,
    PreflightChecks,
    CredentialSetup,
    BackingUp,
    Pruning,
    Reporting,
    Done,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Start => "start",
            RunPhase::Locking => "locking",
            RunPhase::PreflightChecks => "preflight-checks",
            RunPhase::CredentialSetup => "credential-setup",
            RunPhase::BackingUp => "backing-up",
            RunPhase::Pruning => "pruning",
            RunPhase::Reporting => "reporting",
            RunPhase::Done => "done",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

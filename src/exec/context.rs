// src/exec/context.rs

use std::time::Duration;

use tokio::time::Instant;

/// Longest deadline a context accepts. Settings above it are rejected.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Per-run context threaded through every external call.
///
/// Carries the run deadline; subprocesses still alive when it passes are
/// killed.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    deadline: Instant,
}

impl RunContext {
    /// Context whose deadline is `timeout` from now, capped at
    /// [`MAX_TIMEOUT`].
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout.min(MAX_TIMEOUT),
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

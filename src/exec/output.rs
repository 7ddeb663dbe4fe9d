// src/exec/output.rs

//! Captured command output and its classification into log events.
//!
//! Classification is kept separate from emission so the mapping from
//! output lines to events can be checked without a subscriber:
//!
//! - every non-empty stderr line becomes an error event,
//! - a failed command adds one error event carrying the failure,
//! - a successful command turns every non-empty stdout line into an info
//!   event.

use std::fmt;

use tracing::{error, info};

/// How an external command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    /// The process exited with this code.
    Exited(i32),
    /// The process was terminated by a signal.
    Signaled,
    /// The run deadline passed; the process was killed.
    TimedOut,
    /// The process could not be started.
    SpawnFailed(String),
    /// Waiting on the process failed.
    WaitFailed(String),
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        matches!(self, CommandStatus::Exited(0))
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            CommandStatus::Exited(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Exited(code) => write!(f, "exit status {code}"),
            CommandStatus::Signaled => f.write_str("terminated by signal"),
            CommandStatus::TimedOut => f.write_str("killed after the run deadline"),
            CommandStatus::SpawnFailed(e) => write!(f, "cannot start process: {e}"),
            CommandStatus::WaitFailed(e) => write!(f, "cannot wait for process: {e}"),
        }
    }
}

/// Everything captured from one command. stdout and stderr are kept in
/// separate buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn new(status: CommandStatus, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Result for a process that never produced output.
    pub fn from_status(status: CommandStatus) -> Self {
        Self::new(status, String::new(), String::new())
    }

    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        non_empty_lines(&self.stdout)
    }

    pub fn stderr_lines(&self) -> impl Iterator<Item = &str> {
        non_empty_lines(&self.stderr)
    }
}

/// Lines with at least one non-whitespace character, without the line
/// terminator.
pub fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
}

/// One log event derived from a command result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Stderr(String),
    Stdout(String),
    Failed(CommandStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Error,
}

impl OutputEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            OutputEvent::Stdout(_) => EventLevel::Info,
            OutputEvent::Stderr(_) | OutputEvent::Failed(_) => EventLevel::Error,
        }
    }
}

/// Map a command result to the ordered list of events to log.
pub fn classify(result: &CommandResult) -> Vec<OutputEvent> {
    let mut events: Vec<OutputEvent> = result
        .stderr_lines()
        .map(|line| OutputEvent::Stderr(line.to_string()))
        .collect();

    if result.success() {
        events.extend(
            result
                .stdout_lines()
                .map(|line| OutputEvent::Stdout(line.to_string())),
        );
    } else {
        events.push(OutputEvent::Failed(result.status.clone()));
    }

    events
}

/// Log each event, tagged with the program and operation.
pub fn emit(events: &[OutputEvent], cmd: &str, operation: &str) {
    for event in events {
        match event {
            OutputEvent::Stderr(line) => error!(cmd, operation, "{line}"),
            OutputEvent::Stdout(line) => info!(cmd, operation, "{line}"),
            OutputEvent::Failed(status) => error!(
                cmd,
                operation,
                error = %status,
                "failed to execute the command"
            ),
        }
    }
}

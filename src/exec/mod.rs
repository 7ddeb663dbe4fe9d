// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs external commands with `tokio::process::Command`,
//! keeping stdout and stderr apart and turning them into log events.
//!
//! - [`context`] holds the per-run deadline every subprocess honours.
//! - [`invocation`] describes a command: program, arguments, child-only
//!   environment.
//! - [`output`] holds the captured result and its classification into log
//!   events.
//! - [`runner`] provides the `CommandRunner` trait, the production
//!   `ProcessRunner`, and `run_and_log`, which every engine call goes
//!   through.
//! - [`lookup`] resolves executables on `PATH`.

pub mod context;
pub mod invocation;
pub mod lookup;
pub mod output;
pub mod runner;

pub use context::{RunContext, MAX_TIMEOUT};
pub use invocation::Invocation;
pub use lookup::find_executable;
pub use output::{classify, emit, CommandResult, CommandStatus, EventLevel, OutputEvent};
pub use runner::{run_and_log, CommandRunner, ProcessRunner};

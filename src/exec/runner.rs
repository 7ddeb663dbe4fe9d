// src/exec/runner.rs

//! External process runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::exec::context::RunContext;
use crate::exec::invocation::Invocation;
use crate::exec::lookup::find_executable;
use crate::exec::output::{classify, emit, CommandResult, CommandStatus};
use crate::types::BoxFuture;

/// How long to wait for the output pipes after killing a process that
/// outlived the deadline. A grandchild may still hold them open.
const KILLED_OUTPUT_GRACE: Duration = Duration::from_secs(2);

/// Trait abstracting how external commands are executed.
///
/// Production code uses [`ProcessRunner`]; tests provide a fake that records
/// invocations and returns canned results.
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion (or until the context deadline) and
    /// return what it produced. Never logs the output itself.
    fn run<'a>(
        &'a self,
        ctx: &'a RunContext,
        invocation: &'a Invocation,
    ) -> BoxFuture<'a, CommandResult>;

    /// Locate `program` the way [`run`](Self::run) would start it.
    fn resolve_executable(&self, program: &Path) -> Option<PathBuf> {
        find_executable(program)
    }
}

/// Run `invocation` through `runner` and log every output line.
///
/// All output is logged before the result is returned, so callers only need
/// to act on [`CommandResult::success`].
pub async fn run_and_log(
    runner: &dyn CommandRunner,
    ctx: &RunContext,
    invocation: &Invocation,
) -> CommandResult {
    debug!(invocation = ?invocation, "running external command");

    let result = runner.run(ctx, invocation).await;
    let events = classify(&result);
    emit(&events, &invocation.display_program(), invocation.operation());

    debug!(
        cmd = %invocation.display_program(),
        operation = invocation.operation(),
        status = %result.status,
        "external command finished"
    );
    result
}

/// Real runner backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run<'a>(
        &'a self,
        ctx: &'a RunContext,
        invocation: &'a Invocation,
    ) -> BoxFuture<'a, CommandResult> {
        Box::pin(run_process(ctx, invocation))
    }
}

async fn run_process(ctx: &RunContext, invocation: &Invocation) -> CommandResult {
    let mut cmd = Command::new(invocation.program());
    cmd.args(invocation.get_args())
        .envs(invocation.get_env().iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return CommandResult::from_status(CommandStatus::SpawnFailed(e.to_string())),
    };

    // Drain both pipes concurrently so neither can fill up and stall the child.
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    let mut status = tokio::select! {
        status_res = child.wait() => match status_res {
            Ok(status) => match status.code() {
                Some(code) => CommandStatus::Exited(code),
                None => CommandStatus::Signaled,
            },
            Err(e) => CommandStatus::WaitFailed(e.to_string()),
        },

        _ = tokio::time::sleep_until(ctx.deadline()) => {
            warn!(
                cmd = %invocation.display_program(),
                operation = invocation.operation(),
                "run deadline reached; killing process"
            );
            // `kill` also waits for the child, so it is reaped here.
            if let Err(e) = child.kill().await {
                warn!(
                    cmd = %invocation.display_program(),
                    error = %e,
                    "failed to kill child process"
                );
            }
            CommandStatus::TimedOut
        }
    };

    let (stdout, stderr) = if status == CommandStatus::TimedOut {
        (
            collect_with_grace(stdout).await,
            collect_with_grace(stderr).await,
        )
    } else {
        // A grandchild may inherit the pipes and outlive the process itself.
        let (stdout, stderr) = tokio::join!(
            collect_until(stdout, ctx.deadline()),
            collect_until(stderr, ctx.deadline())
        );
        match (stdout, stderr) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            (stdout, stderr) => {
                warn!(
                    cmd = %invocation.display_program(),
                    operation = invocation.operation(),
                    "run deadline reached while draining output; a descendant still holds the pipes"
                );
                status = CommandStatus::TimedOut;
                (stdout.unwrap_or_default(), stderr.unwrap_or_default())
            }
        }
    };

    CommandResult::new(status, stdout, stderr)
}

fn spawn_reader<R>(stream: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            if let Err(e) = stream.read_to_end(&mut buf).await {
                debug!(error = %e, "error reading child output");
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// `None` if the reader is still blocked at `deadline`; it is aborted then.
async fn collect_until(handle: JoinHandle<String>, deadline: Instant) -> Option<String> {
    let abort = handle.abort_handle();
    match tokio::time::timeout_at(deadline, handle).await {
        Ok(joined) => Some(joined.unwrap_or_default()),
        Err(_) => {
            abort.abort();
            None
        }
    }
}

async fn collect_with_grace(handle: JoinHandle<String>) -> String {
    let abort = handle.abort_handle();
    match tokio::time::timeout(KILLED_OUTPUT_GRACE, handle).await {
        Ok(joined) => joined.unwrap_or_default(),
        Err(_) => {
            abort.abort();
            String::new()
        }
    }
}

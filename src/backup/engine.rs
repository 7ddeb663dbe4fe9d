// src/backup/engine.rs

use std::path::{Path, PathBuf};

use crate::backup::retention::RetentionPolicy;
use crate::config::EngineSettings;
use crate::exec::{run_and_log, CommandResult, CommandRunner, Invocation, RunContext};
use crate::secrets::SecretSet;

/// The external backup engine (restic by default) as seen by the
/// orchestrator: a resolved executable plus the credential environment,
/// invoked through a [`CommandRunner`].
pub struct Engine<'a> {
    runner: &'a dyn CommandRunner,
    program: PathBuf,
    env: Vec<(String, String)>,
}

impl<'a> Engine<'a> {
    pub fn new(runner: &'a dyn CommandRunner, program: PathBuf, secrets: &SecretSet) -> Self {
        Self {
            runner,
            program,
            env: secrets.env(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// `backup -o s3.storage-class=<class> --files-from <path> --exclude-file <path>`
    pub async fn backup(&self, ctx: &RunContext, settings: &EngineSettings) -> CommandResult {
        let invocation = self.invocation(backup_args(settings));
        run_and_log(self.runner, ctx, &invocation).await
    }

    /// `forget -q --prune --keep-...` for the given policy.
    pub async fn forget(&self, ctx: &RunContext, policy: &RetentionPolicy) -> CommandResult {
        let invocation = self.invocation(policy.forget_args());
        run_and_log(self.runner, ctx, &invocation).await
    }

    fn invocation(&self, args: Vec<String>) -> Invocation {
        Invocation::new(&self.program)
            .args(args)
            .envs(self.env.iter().cloned())
    }
}

/// Arguments of the backup operation.
pub fn backup_args(settings: &EngineSettings) -> Vec<String> {
    vec![
        "backup".to_string(),
        "-o".to_string(),
        format!("s3.storage-class={}", settings.storage_class),
        "--files-from".to_string(),
        settings.files_from.display().to_string(),
        "--exclude-file".to_string(),
        settings.exclude_file.display().to_string(),
    ]
}

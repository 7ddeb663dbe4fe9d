// src/orchestrator/run.rs

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::backup::{prune, Engine, RetentionPolicy};
use crate::config::RunSettings;
use crate::errors::{MetricsError, Result, RunError};
use crate::exec::{CommandRunner, ProcessRunner, RunContext};
use crate::lock::{self, LockAttempt};
use crate::metrics::{sink_from_settings, MetricsReporter, MetricsSink};
use crate::power::{CommandPowerSource, PowerSource};
use crate::secrets::{KeychainStore, SecretSet, SecretStore};
use crate::types::SkipReason;

use super::{RunOutcome, RunPhase, RunReport};

/// The external services a run talks to.
pub struct Collaborators {
    pub runner: Box<dyn CommandRunner>,
    pub secrets: Box<dyn SecretStore>,
    pub power: Box<dyn PowerSource>,
    pub metrics: Box<dyn MetricsSink>,
}

impl Collaborators {
    /// Production collaborators for `settings`.
    pub fn from_settings(settings: &RunSettings) -> std::result::Result<Self, MetricsError> {
        Ok(Self {
            runner: Box::new(ProcessRunner::new()),
            secrets: Box::new(KeychainStore::new(
                settings.secret_command.clone(),
                settings.secret_timeout,
            )),
            power: Box::new(CommandPowerSource::new(&settings.power_command)),
            metrics: sink_from_settings(&settings.metrics)?,
        })
    }
}

/// Runs one guarded backup: lock, preflight, credentials, backup, prune,
/// report.
pub struct Orchestrator {
    settings: RunSettings,
    deps: Collaborators,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(settings: RunSettings, deps: Collaborators) -> Self {
        Self { settings, deps }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Execute the run sequence once.
    ///
    /// The instance lock, once taken, is held for the rest of this call and
    /// released when it returns, whatever the outcome.
    pub async fn run(&self) -> Result<RunOutcome> {
        enter(RunPhase::Start);
        let started = Instant::now();
        let ctx = RunContext::with_timeout(self.settings.run_timeout);

        enter(RunPhase::Locking);
        let lock_path = &self.settings.lock_path;
        let _lock = match lock::try_acquire(lock_path) {
            Ok(LockAttempt::Acquired(handle)) => handle,
            Ok(LockAttempt::Busy) => {
                warn!(
                    lock = %lock_path.display(),
                    "another instance of the program is already running; exiting"
                );
                enter(RunPhase::Done);
                return Ok(RunOutcome::Skipped(SkipReason::LockBusy));
            }
            Err(err) => {
                error!(error = %err, "cannot lock the lock file");
                return Err(err.into());
            }
        };

        let outcome = self.run_locked(&ctx, started).await;
        enter(RunPhase::Done);
        outcome
    }

    async fn run_locked(&self, ctx: &RunContext, started: Instant) -> Result<RunOutcome> {
        enter(RunPhase::PreflightChecks);
        let configured = &self.settings.engine.executable;
        let Some(program) = self.deps.runner.resolve_executable(configured) else {
            error!(cmd = %configured.display(), "cannot find the backup engine command");
            return Err(RunError::EngineNotFound(configured.clone()));
        };

        let on_ac = match self.deps.power.is_on_ac_power(ctx).await {
            Ok(on_ac) => on_ac,
            Err(err) => {
                error!(error = %err, "cannot check if the system is running on AC power");
                return Err(err.into());
            }
        };
        if self.settings.require_ac_power && !on_ac {
            warn!("the system is not running on AC power; skipping backup");
            return Ok(RunOutcome::Skipped(SkipReason::OnBattery));
        }
        debug!(on_ac, "power check passed");

        enter(RunPhase::CredentialSetup);
        let secrets =
            match SecretSet::fetch_all(self.deps.secrets.as_ref(), &self.settings.secret_service, ctx)
                .await
            {
                Ok(secrets) => secrets,
                Err(err) => {
                    error!(
                        service = %self.settings.secret_service,
                        error = %err,
                        "cannot get security data"
                    );
                    return Err(err.into());
                }
            };
        let engine = Engine::new(self.deps.runner.as_ref(), program, &secrets);

        enter(RunPhase::BackingUp);
        let backup = engine.backup(ctx, &self.settings.engine).await;
        if !backup.success() {
            error!(
                cmd = %engine.program().display(),
                command = "backup",
                status = %backup.status,
                "backup failed"
            );
            return Err(RunError::BackupFailed(backup.status));
        }

        let pruned = if self.settings.cleanup_enabled {
            enter(RunPhase::Pruning);
            Some(prune(&engine, ctx, &RetentionPolicy::default()).await)
        } else {
            None
        };

        enter(RunPhase::Reporting);
        let duration = started.elapsed();
        let metrics_pushed = self.report(ctx, duration).await;

        info!(duration = ?duration, "backup completed successfully");
        Ok(RunOutcome::Completed(RunReport {
            duration,
            pruned,
            metrics_pushed,
        }))
    }

    async fn report(&self, ctx: &RunContext, duration: Duration) -> bool {
        let reporter = MetricsReporter::new(
            self.deps.metrics.as_ref(),
            &self.settings.metrics,
            &self.settings.host_name,
        );
        match reporter.report(ctx, duration).await {
            Ok(()) => {
                info!(namespace = %self.settings.metrics.namespace, "sent backup metrics");
                true
            }
            Err(err) => {
                error!(error = %err, "cannot send backup metrics");
                false
            }
        }
    }
}

fn enter(phase: RunPhase) {
    debug!(phase = %phase, "entering run phase");
}

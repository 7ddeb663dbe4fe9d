// tests/orchestrator_scenarios.rs

mod common;
use crate::common::init_tracing;

use std::path::PathBuf;

use backup_guard::errors::RunError;
use backup_guard::exec::{CommandResult, CommandStatus};
use backup_guard::lock::{try_acquire, LockAttempt};
use backup_guard::metrics::{BACKUP_COUNT, BACKUP_DURATION};
use backup_guard::orchestrator::{exit_status, Orchestrator, RunOutcome};
use backup_guard::secrets::SECRET_SPECS;
use backup_guard::types::SkipReason;
use backup_guard_test_utils::builders::SettingsBuilder;
use backup_guard_test_utils::fakes::{
    FakePowerSource, FakeRunner, FakeSecretStore, Fakes, RecordingSink, SecretFailure,
};
use backup_guard_test_utils::with_timeout;

fn orchestrator(builder: SettingsBuilder, fakes: &Fakes) -> Orchestrator {
    Orchestrator::new(builder.build(), fakes.collaborators())
}

#[tokio::test]
async fn happy_path_backs_up_prunes_and_reports() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes::happy();
    let orch = orchestrator(SettingsBuilder::new(dir.path()).cleanup(true), &fakes);

    let result = with_timeout(orch.run()).await;

    let report = match &result {
        Ok(RunOutcome::Completed(report)) => report.clone(),
        other => panic!("expected a completed run, got: {other:?}"),
    };
    assert_eq!(report.pruned, Some(true));
    assert!(report.metrics_pushed);
    assert_eq!(exit_status(&result), 0);

    assert_eq!(fakes.runner.operations(), vec!["backup", "forget"]);

    let pushes = fakes.sink.pushes();
    assert_eq!(pushes.len(), 1);
    let (namespace, points) = &pushes[0];
    assert_eq!(namespace, "ResticBackup");
    let names: Vec<&str> = points.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec![BACKUP_DURATION, BACKUP_COUNT]);
    assert!(points.iter().all(|p| p.dimension.value == "test-host"));
    assert_eq!(points[0].value, report.duration.as_secs_f64());
}

#[tokio::test]
async fn engine_receives_credentials_through_its_environment() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes::happy();
    let orch = orchestrator(SettingsBuilder::new(dir.path()).executable("/opt/restic"), &fakes);

    with_timeout(orch.run()).await.unwrap();

    let invocations = fakes.runner.invocations();
    assert_eq!(invocations.len(), 1);
    let backup = &invocations[0];
    assert_eq!(backup.program(), PathBuf::from("/opt/restic").as_path());
    for spec in SECRET_SPECS {
        let value = backup
            .get_env()
            .iter()
            .find(|(k, _)| k == spec.env_var)
            .map(|(_, v)| v.clone());
        assert_eq!(value, Some(FakeSecretStore::value_for(spec.account)));
    }
    // Only the child gets the credentials.
    assert!(std::env::var("RESTIC_PASSWORD").is_err());
}

#[tokio::test]
async fn held_lock_skips_without_side_effects() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let builder = SettingsBuilder::new(dir.path());
    let fakes = Fakes::happy();
    let orch = orchestrator(builder, &fakes);

    let _held = match try_acquire(&orch.settings().lock_path).unwrap() {
        LockAttempt::Acquired(handle) => handle,
        LockAttempt::Busy => panic!("expected to acquire a free lock"),
    };

    let result = with_timeout(orch.run()).await;

    assert_eq!(result.as_ref().ok(), Some(&RunOutcome::Skipped(SkipReason::LockBusy)));
    assert_eq!(exit_status(&result), 0);
    assert!(fakes.runner.invocations().is_empty());
    assert!(fakes.secrets.calls().is_empty());
    assert_eq!(fakes.power.calls(), 0);
    assert!(fakes.sink.pushes().is_empty());
}

#[tokio::test]
async fn battery_power_skips_when_ac_is_required() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes {
        power: FakePowerSource::battery(),
        ..Fakes::happy()
    };
    let orch = orchestrator(
        SettingsBuilder::new(dir.path()).require_ac_power(true),
        &fakes,
    );

    let result = with_timeout(orch.run()).await;

    assert_eq!(result.as_ref().ok(), Some(&RunOutcome::Skipped(SkipReason::OnBattery)));
    assert_eq!(exit_status(&result), 0);
    assert!(fakes.runner.invocations().is_empty());
    assert!(fakes.secrets.calls().is_empty());
    assert!(fakes.sink.pushes().is_empty());
}

#[tokio::test]
async fn battery_power_is_fine_when_ac_is_not_required() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes {
        power: FakePowerSource::battery(),
        ..Fakes::happy()
    };
    let orch = orchestrator(
        SettingsBuilder::new(dir.path()).require_ac_power(false),
        &fakes,
    );

    let result = with_timeout(orch.run()).await;

    assert!(matches!(result, Ok(RunOutcome::Completed(_))));
    assert_eq!(fakes.power.calls(), 1);
    assert_eq!(fakes.runner.operations(), vec!["backup"]);
}

#[tokio::test]
async fn secret_timeout_aborts_before_the_engine_runs() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes {
        secrets: FakeSecretStore::new().failing("repository", SecretFailure::Timeout),
        ..Fakes::happy()
    };
    let orch = orchestrator(SettingsBuilder::new(dir.path()), &fakes);

    let result = with_timeout(orch.run()).await;

    assert!(matches!(result, Err(RunError::Secret(_))));
    assert_eq!(exit_status(&result), 1);
    assert!(fakes.runner.invocations().is_empty());
    assert!(fakes.sink.pushes().is_empty());

    // The lock is released on the error path.
    assert!(matches!(
        try_acquire(&orch.settings().lock_path).unwrap(),
        LockAttempt::Acquired(_)
    ));
}

#[tokio::test]
async fn empty_secret_aborts_the_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes {
        secrets: FakeSecretStore::new().failing("password", SecretFailure::Empty),
        ..Fakes::happy()
    };
    let orch = orchestrator(SettingsBuilder::new(dir.path()), &fakes);

    let result = with_timeout(orch.run()).await;

    assert!(matches!(result, Err(RunError::Secret(_))));
    assert!(fakes.runner.invocations().is_empty());
}

#[tokio::test]
async fn failed_backup_skips_prune_and_metrics() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes {
        runner: FakeRunner::new().with_result(
            "backup",
            CommandResult::new(CommandStatus::Exited(2), "", "repository locked\n"),
        ),
        ..Fakes::happy()
    };
    let orch = orchestrator(SettingsBuilder::new(dir.path()).cleanup(true), &fakes);

    let result = with_timeout(orch.run()).await;

    match &result {
        Err(RunError::BackupFailed(status)) => assert_eq!(*status, CommandStatus::Exited(2)),
        other => panic!("expected RunError::BackupFailed, got: {other:?}"),
    }
    assert_eq!(exit_status(&result), 1);
    assert_eq!(fakes.runner.operations(), vec!["backup"]);
    assert!(fakes.sink.pushes().is_empty());
}

#[tokio::test]
async fn failed_prune_still_completes_and_reports() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes {
        runner: FakeRunner::new().with_result(
            "forget",
            CommandResult::new(CommandStatus::Exited(1), "", "unable to prune\n"),
        ),
        ..Fakes::happy()
    };
    let orch = orchestrator(SettingsBuilder::new(dir.path()).cleanup(true), &fakes);

    let result = with_timeout(orch.run()).await;

    match &result {
        Ok(RunOutcome::Completed(report)) => {
            assert_eq!(report.pruned, Some(false));
            assert!(report.metrics_pushed);
        }
        other => panic!("expected a completed run, got: {other:?}"),
    }
    assert_eq!(exit_status(&result), 0);
    assert_eq!(fakes.runner.operations(), vec!["backup", "forget"]);
    assert_eq!(fakes.sink.pushes().len(), 1);
}

#[tokio::test]
async fn disabled_cleanup_never_prunes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes::happy();
    let orch = orchestrator(SettingsBuilder::new(dir.path()).cleanup(false), &fakes);

    let result = with_timeout(orch.run()).await;

    match &result {
        Ok(RunOutcome::Completed(report)) => assert_eq!(report.pruned, None),
        other => panic!("expected a completed run, got: {other:?}"),
    }
    assert_eq!(fakes.runner.operations(), vec!["backup"]);
}

#[tokio::test]
async fn metrics_failure_does_not_fail_the_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes {
        sink: RecordingSink::failing(),
        ..Fakes::happy()
    };
    let orch = orchestrator(SettingsBuilder::new(dir.path()), &fakes);

    let result = with_timeout(orch.run()).await;

    match &result {
        Ok(RunOutcome::Completed(report)) => assert!(!report.metrics_pushed),
        other => panic!("expected a completed run, got: {other:?}"),
    }
    assert_eq!(exit_status(&result), 0);
    assert_eq!(fakes.sink.pushes().len(), 1);
}

#[tokio::test]
async fn missing_engine_is_fatal() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes {
        runner: FakeRunner::new().unresolvable(),
        ..Fakes::happy()
    };
    let orch = orchestrator(SettingsBuilder::new(dir.path()), &fakes);

    let result = with_timeout(orch.run()).await;

    match &result {
        Err(RunError::EngineNotFound(path)) => {
            assert_eq!(path, &PathBuf::from("/usr/local/bin/restic"))
        }
        other => panic!("expected RunError::EngineNotFound, got: {other:?}"),
    }
    assert_eq!(exit_status(&result), 1);
    assert_eq!(fakes.power.calls(), 0);
    assert!(fakes.secrets.calls().is_empty());
}

#[tokio::test]
async fn broken_power_check_is_fatal() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes {
        power: FakePowerSource::broken(),
        ..Fakes::happy()
    };
    let orch = orchestrator(SettingsBuilder::new(dir.path()), &fakes);

    let result = with_timeout(orch.run()).await;

    assert!(matches!(result, Err(RunError::PowerCheck(_))));
    assert_eq!(exit_status(&result), 1);
    assert!(fakes.secrets.calls().is_empty());
    assert!(fakes.runner.invocations().is_empty());
}

#[tokio::test]
async fn missing_lock_directory_is_fatal() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fakes = Fakes::happy();
    let orch = orchestrator(SettingsBuilder::new(dir.path().join("gone")), &fakes);

    let result = with_timeout(orch.run()).await;

    assert!(matches!(result, Err(RunError::Lock(_))));
    assert_eq!(exit_status(&result), 1);
    assert_eq!(fakes.power.calls(), 0);
}

#[cfg(unix)]
mod with_real_processes {
    use super::*;

    use std::time::Duration;

    use backup_guard::exec::ProcessRunner;
    use backup_guard::orchestrator::Collaborators;

    fn collaborators(fakes: &Fakes) -> Collaborators {
        Collaborators {
            runner: Box::new(ProcessRunner::new()),
            ..fakes.collaborators()
        }
    }

    #[tokio::test]
    async fn engine_exit_status_drives_the_outcome() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let fakes = Fakes::happy();

        // `true` and `false` ignore their arguments.
        let ok = Orchestrator::new(
            SettingsBuilder::new(dir.path()).executable("true").build(),
            collaborators(&fakes),
        );
        assert!(matches!(
            with_timeout(ok.run()).await,
            Ok(RunOutcome::Completed(_))
        ));

        let failing = Orchestrator::new(
            SettingsBuilder::new(dir.path()).executable("false").build(),
            collaborators(&fakes),
        );
        match with_timeout(failing.run()).await {
            Err(RunError::BackupFailed(status)) => assert_eq!(status, CommandStatus::Exited(1)),
            other => panic!("expected RunError::BackupFailed, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_deadline_stops_a_hanging_engine() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let engine = common::write_script(dir.path(), "restic", "exec sleep 30");
        let fakes = Fakes::happy();
        let settings = SettingsBuilder::new(dir.path())
            .executable(engine)
            .run_timeout_secs(1)
            .build();
        let orch = Orchestrator::new(settings, collaborators(&fakes));

        let result = tokio::time::timeout(Duration::from_secs(10), orch.run())
            .await
            .expect("run should stop at its deadline");

        match result {
            Err(RunError::BackupFailed(status)) => assert_eq!(status, CommandStatus::TimedOut),
            other => panic!("expected a timed-out backup, got: {other:?}"),
        }
        assert!(fakes.sink.pushes().is_empty());
    }
}

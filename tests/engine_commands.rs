// tests/engine_commands.rs

mod common;
use crate::common::init_tracing;

use std::path::PathBuf;
use std::time::Duration;

use backup_guard::backup::{backup_args, prune, Engine, RetentionPolicy};
use backup_guard::exec::{CommandResult, CommandStatus, RunContext};
use backup_guard::secrets::SecretSet;
use backup_guard_test_utils::builders::SettingsBuilder;
use backup_guard_test_utils::fakes::{FakeRunner, FakeSecretStore};

fn ctx() -> RunContext {
    RunContext::with_timeout(Duration::from_secs(10))
}

async fn secrets() -> SecretSet {
    SecretSet::fetch_all(&FakeSecretStore::new(), "restic_backup", &ctx())
        .await
        .unwrap()
}

#[test]
fn forget_arguments_are_fixed() {
    let policy = RetentionPolicy::default();

    let expected: Vec<String> = [
        "forget",
        "-q",
        "--prune",
        "--keep-hourly",
        "4",
        "--keep-daily",
        "7",
        "--keep-weekly",
        "5",
        "--keep-monthly",
        "12",
        "--keep-yearly",
        "5",
        "--keep-tag",
        "nodelete",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    assert_eq!(policy.forget_args(), expected);
    assert_eq!(policy.forget_args(), RetentionPolicy::default().forget_args());
}

#[test]
fn backup_arguments_carry_lists_and_storage_class() {
    let dir = tempfile::tempdir().unwrap();
    let settings = SettingsBuilder::new(dir.path()).build();

    let args = backup_args(&settings.engine);

    assert_eq!(
        args,
        vec![
            "backup".to_string(),
            "-o".to_string(),
            "s3.storage-class=STANDARD_IA".to_string(),
            "--files-from".to_string(),
            dir.path().join("backup.txt").display().to_string(),
            "--exclude-file".to_string(),
            dir.path().join("exclude.txt").display().to_string(),
        ]
    );
}

#[tokio::test]
async fn engine_invocations_carry_the_credential_environment() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let settings = SettingsBuilder::new(dir.path()).build();
    let runner = FakeRunner::new();
    let secrets = secrets().await;
    let engine = Engine::new(&runner, PathBuf::from("/opt/restic"), &secrets);

    assert!(engine.backup(&ctx(), &settings.engine).await.success());

    let invocations = runner.invocations();
    assert_eq!(invocations.len(), 1);
    let backup = &invocations[0];
    assert_eq!(backup.program(), PathBuf::from("/opt/restic").as_path());
    assert_eq!(backup.operation(), "backup");
    assert_eq!(backup.get_env(), secrets.env().as_slice());
}

#[tokio::test]
async fn prune_reports_engine_success() {
    init_tracing();
    let runner = FakeRunner::new();
    let secrets = secrets().await;
    let engine = Engine::new(&runner, PathBuf::from("restic"), &secrets);

    assert!(prune(&engine, &ctx(), &RetentionPolicy::default()).await);
    assert_eq!(runner.operations(), vec!["forget"]);
    assert_eq!(
        runner.invocations()[0].get_args(),
        RetentionPolicy::default().forget_args().as_slice()
    );
}

#[tokio::test]
async fn prune_failure_is_reported_not_raised() {
    init_tracing();
    let runner = FakeRunner::new().with_result(
        "forget",
        CommandResult::new(CommandStatus::Exited(1), "", "repository is already locked\n"),
    );
    let secrets = secrets().await;
    let engine = Engine::new(&runner, PathBuf::from("restic"), &secrets);

    assert!(!prune(&engine, &ctx(), &RetentionPolicy::default()).await);
}

// tests/instance_lock.rs

use std::time::{Duration, Instant};

use backup_guard::errors::LockError;
use backup_guard::lock::{try_acquire, LockAttempt};

#[test]
fn first_attempt_acquires_and_creates_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".restic_backup_lock");

    let attempt = try_acquire(&path).unwrap();

    match attempt {
        LockAttempt::Acquired(handle) => assert_eq!(handle.path(), path),
        LockAttempt::Busy => panic!("expected to acquire a free lock"),
    }
    assert!(path.exists());
}

#[test]
fn second_attempt_is_busy_without_waiting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lock");

    let _held = match try_acquire(&path).unwrap() {
        LockAttempt::Acquired(handle) => handle,
        LockAttempt::Busy => panic!("expected to acquire a free lock"),
    };

    let started = Instant::now();
    let second = try_acquire(&path).unwrap();

    assert!(matches!(second, LockAttempt::Busy));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn dropping_the_handle_releases_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lock");

    let first = try_acquire(&path).unwrap();
    assert!(matches!(first, LockAttempt::Acquired(_)));
    drop(first);

    assert!(matches!(try_acquire(&path).unwrap(), LockAttempt::Acquired(_)));
}

#[test]
fn existing_contents_are_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lock");
    std::fs::write(&path, "12345").unwrap();

    let _held = try_acquire(&path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "12345");
}

#[test]
fn missing_directory_is_an_error_not_busy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("lock");

    match try_acquire(&path) {
        Err(LockError::Open { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected LockError::Open, got: {other:?}"),
    }
}

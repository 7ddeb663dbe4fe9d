// src/errors.rs

//! Crate-wide error types.
//!
//! Each collaborator has its own error enum so callers can match on the
//! failure class; [`RunError`] is what the orchestrator hands back to
//! `main`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::exec::CommandStatus;

/// Errors raised while loading or validating settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("cannot determine the user home directory")]
    NoHomeDir,
}

/// Instance lock failures other than contention.
#[derive(Error, Debug)]
pub enum LockError {
    #[error("cannot open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("secret '{account}' from service '{service}' not returned within {timeout:?}")]
    Timeout {
        service: String,
        account: String,
        timeout: Duration,
    },

    #[error("cannot run secret store command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("secret store lookup of '{account}' from service '{service}' failed ({status}): {stderr}")]
    Failed {
        service: String,
        account: String,
        status: String,
        stderr: String,
    },

    #[error("secret store returned an empty value for '{account}' from service '{service}'")]
    Empty { service: String, account: String },
}

#[derive(Error, Debug)]
pub enum PowerError {
    #[error("cannot run power status command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("power status command '{program}' failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("power status command '{program}' did not finish before the run deadline")]
    Timeout { program: String },
}

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("metrics endpoint rejected the push with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("metrics push did not finish before the run deadline")]
    DeadlineExceeded,

    #[error("metrics sink error: {0}")]
    Sink(String),
}

/// Fatal outcomes of a backup run. Every variant maps to a non-zero exit.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("backup engine executable not found: {0}")]
    EngineNotFound(PathBuf),

    #[error("cannot determine power state: {0}")]
    PowerCheck(#[from] PowerError),

    #[error("cannot fetch credentials: {0}")]
    Secret(#[from] SecretError),

    #[error("backup command failed: {0}")]
    BackupFailed(CommandStatus),
}

pub type Result<T> = std::result::Result<T, RunError>;

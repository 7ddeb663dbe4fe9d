// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Settings file as read from TOML, before validation.
///
/// ```toml
/// backup_directory = "/home/me/.restic_backup"
/// host_name = "laptop"
/// require_ac_power = true
///
/// [engine]
/// executable_path = "/usr/local/bin/restic"
/// files_from = "backup.txt"
///
/// [metrics]
/// endpoint = "https://metrics.example/put"
/// ```
///
/// Every key is optional and has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSettings {
    /// Root of everything the tool touches on disk. Defaults to
    /// `~/.restic_backup`.
    #[serde(default)]
    pub backup_directory: Option<PathBuf>,

    #[serde(default = "default_lock_file")]
    pub lock_file: String,

    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Host identity used as the metrics dimension value.
    #[serde(default = "default_host_name")]
    pub host_name: String,

    /// Secret store service all credentials are filed under.
    #[serde(default = "default_security_service")]
    pub security_service: String,

    #[serde(default = "default_true")]
    pub require_ac_power: bool,

    #[serde(default)]
    pub cleanup_old_backups: bool,

    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub timeouts: TimeoutsSection,

    #[serde(default)]
    pub host: HostSection,
}

fn default_lock_file() -> String {
    ".restic_backup_lock".to_string()
}

fn default_log_file() -> String {
    "restic_backup.log".to_string()
}

fn default_host_name() -> String {
    "localhost".to_string()
}

fn default_security_service() -> String {
    "restic_backup".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            backup_directory: None,
            lock_file: default_lock_file(),
            log_file: default_log_file(),
            host_name: default_host_name(),
            security_service: default_security_service(),
            require_ac_power: default_true(),
            cleanup_old_backups: false,
            engine: EngineSection::default(),
            metrics: MetricsSection::default(),
            timeouts: TimeoutsSection::default(),
            host: HostSection::default(),
        }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Absolute path, relative path, or bare name looked up on `PATH`.
    #[serde(default = "default_executable_path")]
    pub executable_path: PathBuf,

    #[serde(default = "default_files_from")]
    pub files_from: PathBuf,

    #[serde(default = "default_exclude_file")]
    pub exclude_file: PathBuf,

    #[serde(default = "default_storage_class")]
    pub s3_storage_class: String,
}

fn default_executable_path() -> PathBuf {
    PathBuf::from("/usr/local/bin/restic")
}

fn default_files_from() -> PathBuf {
    PathBuf::from("backup.txt")
}

fn default_exclude_file() -> PathBuf {
    PathBuf::from("exclude.txt")
}

fn default_storage_class() -> String {
    "STANDARD_IA".to_string()
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            executable_path: default_executable_path(),
            files_from: default_files_from(),
            exclude_file: default_exclude_file(),
            s3_storage_class: default_storage_class(),
        }
    }
}

/// `[metrics]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSection {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Name of the dimension carrying `host_name`.
    #[serde(default = "default_dimension")]
    pub dimension: String,

    /// HTTP endpoint receiving the metric document. If `None`, metrics are
    /// only written to the log.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_metrics_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_namespace() -> String {
    "ResticBackup".to_string()
}

fn default_dimension() -> String {
    "Environment".to_string()
}

fn default_metrics_timeout_secs() -> u64 {
    10
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            dimension: default_dimension(),
            endpoint: None,
            timeout_secs: default_metrics_timeout_secs(),
        }
    }
}

/// `[timeouts]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsSection {
    /// Deadline for the whole run, subprocesses included.
    #[serde(default = "default_run_secs")]
    pub run_secs: u64,

    /// Per-lookup bound on the secret store.
    #[serde(default = "default_secret_secs")]
    pub secret_secs: u64,
}

fn default_run_secs() -> u64 {
    30 * 60
}

fn default_secret_secs() -> u64 {
    60
}

impl Default for TimeoutsSection {
    fn default() -> Self {
        Self {
            run_secs: default_run_secs(),
            secret_secs: default_secret_secs(),
        }
    }
}

/// `[host]` section: commands used to query the local machine.
#[derive(Debug, Clone, Deserialize)]
pub struct HostSection {
    /// Program and arguments printing the power source.
    #[serde(default = "default_power_command")]
    pub power_command: Vec<String>,

    /// Keychain-style tool answering `find-generic-password`.
    #[serde(default = "default_secret_command")]
    pub secret_command: String,
}

fn default_power_command() -> Vec<String> {
    vec!["pmset".to_string(), "-g".to_string(), "ps".to_string()]
}

fn default_secret_command() -> String {
    "security".to_string()
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            power_command: default_power_command(),
            secret_command: default_secret_command(),
        }
    }
}

/// Validated, immutable settings for one run.
///
/// Every file path is already resolved against `backup_dir`. Built once by
/// [`crate::config::load_and_validate`] and handed to the orchestrator.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub backup_dir: PathBuf,
    pub lock_file: String,
    pub lock_path: PathBuf,
    pub log_file: String,
    pub log_dir: PathBuf,
    pub engine: EngineSettings,
    pub host_name: String,
    pub secret_service: String,
    pub require_ac_power: bool,
    pub cleanup_enabled: bool,
    pub metrics: MetricsSettings,
    pub run_timeout: Duration,
    pub secret_timeout: Duration,
    pub power_command: Vec<String>,
    pub secret_command: String,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub executable: PathBuf,
    pub files_from: PathBuf,
    pub exclude_file: PathBuf,
    pub storage_class: String,
}

#[derive(Debug, Clone)]
pub struct MetricsSettings {
    pub namespace: String,
    pub dimension: String,
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

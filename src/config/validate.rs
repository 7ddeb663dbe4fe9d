// src/config/validate.rs

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::config::model::{EngineSettings, MetricsSettings, RawSettings, RunSettings};
use crate::errors::SettingsError;
use crate::exec::MAX_TIMEOUT;

type Result<T> = std::result::Result<T, SettingsError>;

impl TryFrom<RawSettings> for RunSettings {
    type Error = SettingsError;

    fn try_from(raw: RawSettings) -> Result<Self> {
        validate_raw_settings(&raw)?;

        let backup_dir = match raw.backup_directory {
            Some(dir) => expand_home(&dir)?,
            None => default_backup_dir()?,
        };

        let engine = EngineSettings {
            executable: resolve_executable_path(&backup_dir, &raw.engine.executable_path),
            files_from: backup_dir.join(&raw.engine.files_from),
            exclude_file: backup_dir.join(&raw.engine.exclude_file),
            storage_class: raw.engine.s3_storage_class,
        };

        let metrics = MetricsSettings {
            namespace: raw.metrics.namespace,
            dimension: raw.metrics.dimension,
            endpoint: raw.metrics.endpoint.filter(|e| !e.trim().is_empty()),
            timeout: Duration::from_secs(raw.metrics.timeout_secs),
        };

        Ok(RunSettings {
            lock_path: backup_dir.join(&raw.lock_file),
            log_dir: backup_dir.join("logs"),
            lock_file: raw.lock_file,
            log_file: raw.log_file,
            engine,
            host_name: raw.host_name,
            secret_service: raw.security_service,
            require_ac_power: raw.require_ac_power,
            cleanup_enabled: raw.cleanup_old_backups,
            metrics,
            run_timeout: Duration::from_secs(raw.timeouts.run_secs),
            secret_timeout: Duration::from_secs(raw.timeouts.secret_secs),
            power_command: raw.host.power_command,
            secret_command: raw.host.secret_command,
            backup_dir,
        })
    }
}

fn validate_raw_settings(raw: &RawSettings) -> Result<()> {
    ensure_file_name("lock_file", &raw.lock_file)?;
    ensure_file_name("log_file", &raw.log_file)?;
    ensure_non_empty("host_name", &raw.host_name)?;
    ensure_non_empty("security_service", &raw.security_service)?;
    ensure_non_empty("engine.s3_storage_class", &raw.engine.s3_storage_class)?;
    ensure_non_empty("metrics.namespace", &raw.metrics.namespace)?;
    ensure_non_empty("metrics.dimension", &raw.metrics.dimension)?;
    ensure_non_empty("host.secret_command", &raw.host.secret_command)?;

    if raw.engine.executable_path.as_os_str().is_empty() {
        return Err(SettingsError::Invalid(
            "engine.executable_path must not be empty".to_string(),
        ));
    }

    if raw.host.power_command.first().is_none_or(|p| p.trim().is_empty()) {
        return Err(SettingsError::Invalid(
            "host.power_command must name a program".to_string(),
        ));
    }

    for (key, secs) in [
        ("timeouts.run_secs", raw.timeouts.run_secs),
        ("timeouts.secret_secs", raw.timeouts.secret_secs),
        ("metrics.timeout_secs", raw.metrics.timeout_secs),
    ] {
        if secs == 0 {
            return Err(SettingsError::Invalid(format!(
                "{key} must be >= 1 (got 0)"
            )));
        }
        if secs > MAX_TIMEOUT.as_secs() {
            return Err(SettingsError::Invalid(format!(
                "{key} must be <= {} (got {secs})",
                MAX_TIMEOUT.as_secs()
            )));
        }
    }

    Ok(())
}

fn ensure_non_empty(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SettingsError::Invalid(format!("{key} must not be empty")));
    }
    Ok(())
}

/// Lock and log files live directly in the backup directory.
fn ensure_file_name(key: &str, value: &str) -> Result<()> {
    ensure_non_empty(key, value)?;
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(SettingsError::Invalid(format!(
            "{key} must be a plain file name (got '{value}')"
        ))),
    }
}

fn default_backup_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".restic_backup"))
        .ok_or(SettingsError::NoHomeDir)
}

/// Expand a leading `~` to the user's home directory.
fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = dirs::home_dir().ok_or(SettingsError::NoHomeDir)?;
            Ok(home.join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}

/// A bare program name stays bare so it can be looked up on `PATH`; any
/// other relative path is anchored in the backup directory.
fn resolve_executable_path(backup_dir: &Path, executable: &Path) -> PathBuf {
    if executable.is_absolute() || executable.components().count() == 1 {
        executable.to_path_buf()
    } else {
        backup_dir.join(executable)
    }
}

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use backup_guard::config::{RawSettings, RunSettings};

/// Builder for `RunSettings` to simplify test setup.
///
/// Starts from the defaults with the backup directory pointed at `dir`, AC
/// power not required and cleanup disabled.
pub struct SettingsBuilder {
    raw: RawSettings,
}

impl SettingsBuilder {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let mut raw = RawSettings::default();
        raw.backup_directory = Some(dir.as_ref().to_path_buf());
        raw.require_ac_power = false;
        raw.host_name = "test-host".to_string();
        Self { raw }
    }

    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw.engine.executable_path = path.into();
        self
    }

    pub fn require_ac_power(mut self, val: bool) -> Self {
        self.raw.require_ac_power = val;
        self
    }

    pub fn cleanup(mut self, val: bool) -> Self {
        self.raw.cleanup_old_backups = val;
        self
    }

    pub fn host_name(mut self, name: &str) -> Self {
        self.raw.host_name = name.to_string();
        self
    }

    pub fn lock_file(mut self, name: &str) -> Self {
        self.raw.lock_file = name.to_string();
        self
    }

    pub fn run_timeout_secs(mut self, secs: u64) -> Self {
        self.raw.timeouts.run_secs = secs;
        self
    }

    pub fn secret_timeout_secs(mut self, secs: u64) -> Self {
        self.raw.timeouts.secret_secs = secs;
        self
    }

    pub fn metrics_endpoint(mut self, endpoint: &str) -> Self {
        self.raw.metrics.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn power_command(mut self, command: &[&str]) -> Self {
        self.raw.host.power_command = command.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn raw(&self) -> &RawSettings {
        &self.raw
    }

    pub fn build(self) -> RunSettings {
        RunSettings::try_from(self.raw).expect("Failed to build valid settings from builder")
    }
}

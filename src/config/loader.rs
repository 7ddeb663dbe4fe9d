// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawSettings, RunSettings};
use crate::errors::SettingsError;

/// Load a settings file from a given path and return the raw `RawSettings`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to get
/// resolved [`RunSettings`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings, SettingsError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let settings: RawSettings = toml::from_str(&contents)?;

    Ok(settings)
}

/// Load a settings file, apply defaults, validate it and resolve every path
/// against the backup directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<RunSettings, SettingsError> {
    let raw = load_from_path(&path)?;
    RunSettings::try_from(raw)
}

/// `~/.restic_backup/config.toml`.
pub fn default_config_path() -> Result<PathBuf, SettingsError> {
    dirs::home_dir()
        .map(|home| home.join(".restic_backup").join("config.toml"))
        .ok_or(SettingsError::NoHomeDir)
}

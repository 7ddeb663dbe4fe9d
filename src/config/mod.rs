// src/config/mod.rs

//! Settings loading and validation for backup-guard.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a settings file from disk (`loader.rs`).
//! - Validate it and resolve paths into [`RunSettings`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    EngineSection, EngineSettings, HostSection, MetricsSection, MetricsSettings, RawSettings,
    RunSettings, TimeoutsSection,
};

// src/lib.rs

pub mod backup;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod lock;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod power;
pub mod secrets;
pub mod types;

use anyhow::{Context, Result};
use tracing::debug;

use crate::backup::{backup_args, RetentionPolicy};
use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, RunSettings};
use crate::logging::{init_logging, LogFile};
use crate::orchestrator::{exit_status, Collaborators, Orchestrator};
use crate::secrets::SECRET_SPECS;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading
/// - logging (stderr + rotated file)
/// - production collaborators (process runner, keychain, power, metrics)
/// - the orchestrator
///
/// Returns the process exit status. Run failures are already logged by the
/// orchestrator; only setup problems come back as `Err`.
pub async fn run(args: CliArgs) -> Result<u8> {
    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let settings = load_and_validate(&config_path)
        .with_context(|| format!("loading settings from {}", config_path.display()))?;

    if args.dry_run {
        let _guard = init_logging(args.log_level, None)?;
        print_dry_run(&settings);
        return Ok(0);
    }

    let _guard = init_logging(
        args.log_level,
        Some(LogFile {
            dir: &settings.log_dir,
            name: &settings.log_file,
        }),
    )?;
    debug!(config = %config_path.display(), "settings loaded");

    let deps = Collaborators::from_settings(&settings).context("building metrics sink")?;
    let orchestrator = Orchestrator::new(settings, deps);
    let result = orchestrator.run().await;

    Ok(exit_status(&result))
}

/// Simple dry-run output: resolved settings and the engine command lines.
fn print_dry_run(settings: &RunSettings) {
    println!("backup-guard dry-run");
    println!("  backup_directory = {}", settings.backup_dir.display());
    println!("  lock_path = {}", settings.lock_path.display());
    println!(
        "  log_path = {}",
        settings.log_dir.join(&settings.log_file).display()
    );
    println!("  host_name = {}", settings.host_name);
    println!("  require_ac_power = {}", settings.require_ac_power);
    println!("  cleanup_old_backups = {}", settings.cleanup_enabled);
    println!("  run_timeout = {:?}", settings.run_timeout);
    println!();

    let program = settings.engine.executable.display();
    println!("commands:");
    println!("  {program} {}", backup_args(&settings.engine).join(" "));
    if settings.cleanup_enabled {
        println!(
            "  {program} {}",
            RetentionPolicy::default().forget_args().join(" ")
        );
    }
    println!();

    println!(
        "secrets (service '{}', {}):",
        settings.secret_service, settings.secret_command
    );
    for spec in SECRET_SPECS {
        println!("  - {} -> {}", spec.account, spec.env_var);
    }
    println!();

    match &settings.metrics.endpoint {
        Some(endpoint) => println!(
            "metrics: push namespace '{}' to {endpoint}",
            settings.metrics.namespace
        ),
        None => println!(
            "metrics: namespace '{}' logged only (no endpoint)",
            settings.metrics.namespace
        ),
    }

    debug!("dry-run complete (no execution)");
}

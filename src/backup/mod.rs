// src/backup/mod.rs

//! The backup engine's command contract.
//!
//! - [`engine`] builds and runs the `backup` and `forget` invocations with
//!   the credential environment attached.
//! - [`retention`] holds the fixed keep-policy and the prune step.

pub mod engine;
pub mod retention;

pub use engine::{backup_args, Engine};
pub use retention::{prune, RetentionPolicy};

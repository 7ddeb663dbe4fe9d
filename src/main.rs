// src/main.rs

use std::process::ExitCode;

use backup_guard::{cli, run};

#[tokio::main]
async fn main() -> ExitCode {
    match run(cli::parse()).await {
        Ok(status) => ExitCode::from(status),
        Err(err) => {
            eprintln!("backup-guard error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

pub mod backup;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core_state;
pub mod daily_log;
pub mod data;
pub mod day_entries;
pub mod db;
pub mod diaries;
pub mod models;
pub mod notifications;
pub mod profile;
pub mod store;
pub mod therapy;
pub mod voiding;

use std::process::ExitCode;

use chrono::Local;
use tracing_subscriber::EnvFilter;

use crate::cli::run::Context;
use crate::cli::Command;
use crate::core_state::CoreState;

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> ExitCode {
    init_tracing();
    let cli = cli::parse();

    let state = match &cli.data_dir {
        Some(dir) => CoreState::with_path(dir.join(config::DATABASE_FILE)),
        None => CoreState::new(),
    };
    tracing::debug!(
        version = config::APP_VERSION,
        db = %state.db_path.display(),
        "Dyna starting"
    );

    let ctx = Context {
        state,
        today: cli.today.unwrap_or_else(|| Local::now().date_naive()),
    };
    match cli.command.unwrap_or(Command::Today).run(&ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

mod cli;
mod config_loader;
mod file_logger;

use clap::Parser;
use cli::Cli;
use file_logger::FileMigrationLogger;
use migrator_core::{format_summary_table, run_migration, SharedLogger};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guards = match init_logging(&cli.log_dir) {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("failed to set up logging in {}: {e}", cli.log_dir.display());
            return ExitCode::FAILURE;
        }
    };

    let config = match config_loader::load_config(&cli.config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("failed to load config from {}: {e}", cli.config_path.display());
            return ExitCode::FAILURE;
        }
    };

    let logger: SharedLogger = match FileMigrationLogger::new(&cli.log_dir) {
        Ok(logger) => Arc::new(logger),
        Err(e) => {
            eprintln!("failed to open log artifacts in {}: {e}", cli.log_dir.display());
            return ExitCode::FAILURE;
        }
    };

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("SIGINT received: finishing in-flight chunks, then stopping");
                cancelled.store(true, Ordering::Relaxed);
            }
        });
    }

    match run_migration(&config, logger, &cancelled).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("migration failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(rows: &[migrator_core::SummaryRow]) {
    print!("{}", format_summary_table(rows));
}

/// Registers a rolling `all.log` appender (every level, `RUST_LOG`-overridable, defaulting to
/// `info`) and a rolling `errors-only.log` appender fixed at `error`. The guards must be kept
/// alive for the process lifetime or buffered lines are lost on exit.
fn init_logging(log_dir: &std::path::Path) -> std::io::Result<(WorkerGuard, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;

    let all_appender = tracing_appender::rolling::never(log_dir, "all.log");
    let (all_writer, all_guard) = tracing_appender::non_blocking(all_appender);

    let errors_appender = tracing_appender::rolling::never(log_dir, "errors-only.log");
    let (errors_writer, errors_guard) = tracing_appender::non_blocking(errors_appender);

    let all_layer = tracing_subscriber::fmt::layer()
        .with_writer(all_writer)
        .with_ansi(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let errors_layer = tracing_subscriber::fmt::layer()
        .with_writer(errors_writer)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"));

    tracing_subscriber::registry()
        .with(all_layer)
        .with(errors_layer)
        .init();

    Ok((all_guard, errors_guard))
}

use clap::Parser;
use std::path::PathBuf;

/// Migrates a MySQL database's structure and data into a PostgreSQL schema.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the migration config file, `.json` or `.xml`.
    pub config_path: PathBuf,

    /// Directory the log artifacts (all.log, errors-only.log, report-only.log, views.log,
    /// not_created_views/) are written to.
    #[arg(long, default_value = "migration-logs")]
    pub log_dir: PathBuf,
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Cli::command().debug_assert()
}

//! Component J: the only shipped [`MigrationLogger`] implementation. `log`/`report_error`/
//! `record_rejected_row` are emitted through `tracing` so they flow into the `all.log`/
//! `errors-only.log` rolling appenders the CLI's subscriber registers (§4.I); the three migration
//! artifacts that are not generic log lines - `report-only.log`, `views.log`, and
//! `not_created_views/<name>.sql` - are written directly by this sink.

use migrator_core::{format_summary_table, ErrorContext, LogLevel, MigrationLogger, SummaryRow};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct FileMigrationLogger {
    report: Mutex<BufWriter<File>>,
    views: Mutex<BufWriter<File>>,
    not_created_views_dir: PathBuf,
}

impl FileMigrationLogger {
    /// Creates `log_dir` (and its `not_created_views` subdirectory) and opens the direct-write
    /// artifacts in append mode.
    pub fn new(log_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(log_dir)?;
        let not_created_views_dir = log_dir.join("not_created_views");
        std::fs::create_dir_all(&not_created_views_dir)?;

        let report = BufWriter::new(open_append(&log_dir.join("report-only.log"))?);
        let views = BufWriter::new(open_append(&log_dir.join("views.log"))?);

        Ok(FileMigrationLogger {
            report: Mutex::new(report),
            views: Mutex::new(views),
            not_created_views_dir,
        })
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl MigrationLogger for FileMigrationLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
    }

    fn report_error(&self, context: &ErrorContext) {
        match &context.sql {
            Some(sql) => tracing::error!(sql = %sql, "{}", context.message),
            None => tracing::error!("{}", context.message),
        }
    }

    fn record_rejected_row(&self, table: &str, raw_row: &str) {
        tracing::error!(table = %table, "rejected row: {raw_row}");
    }

    fn record_view_failure(&self, view_name: &str, raw_ddl: &str, reason: &str) {
        let path = self.not_created_views_dir.join(format!("{view_name}.sql"));
        if let Err(e) = std::fs::write(&path, raw_ddl) {
            tracing::error!(view = %view_name, error = %e, "failed to write not_created_views file");
        }

        let mut views = self.views.lock().expect("views log mutex poisoned");
        let _ = writeln!(views, "{view_name}: {reason}");
        let _ = views.flush();
    }

    fn record_summary(&self, rows: &[SummaryRow]) {
        let mut report = self.report.lock().expect("report log mutex poisoned");
        let _ = write!(report, "{}", format_summary_table(rows));
        let _ = report.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn writes_summary_table_to_report_only_log() {
        let dir = tempfile::tempdir().unwrap();
        let logger = FileMigrationLogger::new(dir.path()).unwrap();

        logger.record_summary(&[SummaryRow {
            qualified_table_name: "\"shop\".\"orders\"".to_string(),
            rows_attempted: 100,
            rows_failed: 1,
            elapsed: Duration::from_secs(2),
        }]);

        let contents = std::fs::read_to_string(dir.path().join("report-only.log")).unwrap();
        assert!(contents.contains("\"shop\".\"orders\""));
        assert!(contents.contains("TABLE"));
        assert!(contents.contains("RECORDS"));
        assert!(contents.contains("100"));
        assert!(contents.contains("FAILED"));
    }

    #[test]
    fn writes_view_failure_to_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let logger = FileMigrationLogger::new(dir.path()).unwrap();

        logger.record_view_failure("active_orders", "CREATE VIEW active_orders AS SELECT 1", "unsupported syntax");

        let views_log = std::fs::read_to_string(dir.path().join("views.log")).unwrap();
        assert!(views_log.contains("active_orders: unsupported syntax"));

        let ddl = std::fs::read_to_string(
            dir.path().join("not_created_views").join("active_orders.sql"),
        )
        .unwrap();
        assert!(ddl.contains("CREATE VIEW"));
    }

    #[test]
    fn creates_not_created_views_directory_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let _logger = FileMigrationLogger::new(dir.path()).unwrap();
        assert!(dir.path().join("not_created_views").is_dir());
    }
}

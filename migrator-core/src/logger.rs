use crate::models::SummaryRow;
use std::sync::Arc;

/// Severity for [`MigrationLogger::log`], mirroring the levels `all.log`/`errors-only.log` filter
/// on.
#[derive(Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Everything the engine needs to know about an error it wants reported, independent of how the
/// host chooses to persist it.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub message: String,
    pub sql: Option<String>,
}

/// The narrow sink the core engine depends on. The engine never opens a log file itself - it
/// only ever calls through this trait, so it stays usable in tests (and in any host, not just a
/// CLI) without dragging in file I/O, log rotation, or a process-wide logger singleton.
pub trait MigrationLogger: Send + Sync {
    /// A free-form progress/info line, destined for `all.log`.
    fn log(&self, level: LogLevel, message: &str);

    /// A structured error, destined for `errors-only.log`.
    fn report_error(&self, context: &ErrorContext);

    /// A row that could not be copied, destined for `errors-only.log` preceded by a marker line
    /// naming the table (per the row-level fallback contract in the data pipeline).
    fn record_rejected_row(&self, table: &str, raw_row: &str);

    /// A view whose rewritten DDL failed to install. The raw MySQL `CREATE VIEW` text is
    /// destined for `not_created_views/<name>.sql`; `reason` is destined for `views.log`.
    fn record_view_failure(&self, view_name: &str, raw_ddl: &str, reason: &str);

    /// The final summary report, one call with every table's row so the sink can pad columns
    /// to the widest value across the whole run.
    fn record_summary(&self, rows: &[SummaryRow]);
}

/// A logger that discards everything. Useful as a default in tests and for library consumers
/// that don't care about the log artifacts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl MigrationLogger for NullLogger {
    fn log(&self, _level: LogLevel, _message: &str) {}
    fn report_error(&self, _context: &ErrorContext) {}
    fn record_rejected_row(&self, _table: &str, _raw_row: &str) {}
    fn record_view_failure(&self, _view_name: &str, _raw_ddl: &str, _reason: &str) {}
    fn record_summary(&self, _rows: &[SummaryRow]) {}
}

/// A convenient shared-pointer alias, since the orchestrator hands the same logger to every
/// parallel worker.
pub type SharedLogger = Arc<dyn MigrationLogger>;

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// An in-memory logger used by unit tests to assert on what was logged.
    #[derive(Default)]
    pub struct RecordingLogger {
        pub lines: Mutex<Vec<String>>,
        pub errors: Mutex<Vec<ErrorContext>>,
        pub rejected_rows: Mutex<Vec<(String, String)>>,
        pub view_failures: Mutex<Vec<(String, String, String)>>,
        pub summary: Mutex<Vec<SummaryRow>>,
    }

    impl MigrationLogger for RecordingLogger {
        fn log(&self, level: LogLevel, message: &str) {
            self.lines
                .lock()
                .unwrap()
                .push(format!("{level:?}: {message}"));
        }

        fn report_error(&self, context: &ErrorContext) {
            self.errors.lock().unwrap().push(context.clone());
        }

        fn record_rejected_row(&self, table: &str, raw_row: &str) {
            self.rejected_rows
                .lock()
                .unwrap()
                .push((table.to_string(), raw_row.to_string()));
        }

        fn record_view_failure(&self, view_name: &str, raw_ddl: &str, reason: &str) {
            self.view_failures.lock().unwrap().push((
                view_name.to_string(),
                raw_ddl.to_string(),
                reason.to_string(),
            ));
        }

        fn record_summary(&self, rows: &[SummaryRow]) {
            self.summary.lock().unwrap().extend_from_slice(rows);
        }
    }
}

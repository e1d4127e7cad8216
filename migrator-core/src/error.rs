use thiserror::Error;

/// All the errors that can occur in the migration engine.
///
/// Each variant carries enough context (offending SQL, table/view name) for the logging sinks
/// to report it without the caller needing to reconstruct it.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Missing or invalid configuration. Fatal before any connection is attempted.
    #[error("configuration error: {0}")]
    Config(String),

    /// Could not reach the source or destination database.
    #[error("could not connect to {target}: {source}")]
    Connect {
        target: ConnectionTarget,
        #[source]
        source: ConnectError,
    },

    /// Destination schema could not be created.
    #[error("could not create destination schema `{schema}`: {source}")]
    Schema {
        schema: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// `SHOW TABLES`/`information_schema` discovery queries failed.
    #[error("failed to discover source structure: {0}")]
    Discovery(#[source] mysql_async::Error),

    /// `CREATE TABLE` failed. Fatal for the whole run, per the ordering invariant.
    #[error("failed to create table \"{schema}\".\"{table}\": {source}\nsql: {sql}")]
    TableCreate {
        schema: String,
        table: String,
        sql: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A single row failed COPY. Recorded in `rows_failed`, never fatal.
    #[error("row {row_number} in \"{schema}\".\"{table}\" failed to copy: {reason}")]
    DataRow {
        schema: String,
        table: String,
        row_number: u64,
        reason: String,
    },

    /// A deferred DDL statement (NOT NULL/DEFAULT/ENUM/COMMENT/SEQUENCE/INDEX) failed. Logged,
    /// non-fatal, migration continues.
    #[error("deferred DDL statement failed on \"{schema}\".\"{table}\": {source}\nsql: {sql}")]
    DeferredDdl {
        schema: String,
        table: String,
        sql: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A foreign key failed to install. Logged, non-fatal.
    #[error("foreign key `{constraint_name}` failed to install: {source}\nsql: {sql}")]
    ForeignKey {
        constraint_name: String,
        sql: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A view failed to rewrite or install. The raw MySQL DDL is written to
    /// `not_created_views/<name>.sql` by the logging sink; this error only carries the reason.
    #[error("view `{view_name}` could not be installed: {reason}")]
    View { view_name: String, reason: String },

    /// The type mapper encountered a MySQL base type with no PostgreSQL equivalent. Fatal for
    /// the containing `CREATE TABLE`, and therefore for the run.
    #[error("unsupported MySQL type `{0}`")]
    UnsupportedType(String),

    /// Generic I/O failure (log files, temp directory).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The operator's config file could not be parsed as JSON or XML.
    #[error("could not parse config file as {format}: {message}")]
    ConfigParse { format: &'static str, message: String },

    /// A raw postgres error with no more specific context available.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// A raw MySQL error with no more specific context available.
    #[error("mysql error: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Which side of the migration a connection error occurred on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ConnectionTarget {
    Source,
    Destination,
}

impl std::fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionTarget::Source => write!(f, "source (MySQL)"),
            ConnectionTarget::Destination => write!(f, "destination (PostgreSQL)"),
        }
    }
}

/// The underlying driver error behind a `MigrationError::Connect`.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error(transparent)]
    MySql(#[from] mysql_async::Error),
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),
}

/// A result type that uses [`MigrationError`] as the error type.
pub type Result<T = ()> = std::result::Result<T, MigrationError>;

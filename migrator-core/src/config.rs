use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// A structured connection descriptor for one side of the migration.
///
/// Resolves Open Question 2: the original design's `dsn, user, password` comma-split triple
/// breaks on a password containing a comma. Here each half of the migration gets its own
/// structured set of fields instead of a delimited string.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Dsn {
    pub host: String,
    #[serde(default = "Dsn::default_mysql_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
}

impl Dsn {
    fn default_mysql_port() -> u16 {
        3306
    }

    pub fn mysql_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            urlencode(&self.user),
            urlencode(&self.password),
            self.host,
            self.port,
            urlencode(&self.database)
        )
    }

    pub fn postgres_connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.database
        )
    }
}

/// Extremely small percent-encoder covering the characters that show up in MySQL credentials and
/// that would otherwise break URL parsing (`:`, `/`, `@`, `%`, whitespace). Not a general-purpose
/// URL encoder.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Typed configuration for a migration run. Produced by the host's config loader (JSON/XML) and
/// handed as-is to the orchestrator - the core never parses a config file itself.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: Dsn,
    pub target: Dsn,
    pub schema: Option<String>,
    pub encoding: String,
    pub data_chunk_size_mb: u64,
    pub data_only: bool,
    pub temp_dir_path: Option<PathBuf>,
    pub max_parallel: NonZeroUsize,
}

impl Config {
    pub const DEFAULT_CHUNK_SIZE_MB: u64 = 10;
    pub const MIN_CHUNK_SIZE_MB: u64 = 1;

    pub fn chunk_target_mb(&self) -> u64 {
        self.data_chunk_size_mb.max(Self::MIN_CHUNK_SIZE_MB)
    }
}

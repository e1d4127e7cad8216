//! Component H: parses the operator's `.json`/`.xml` config file into a typed [`Config`].

use migrator_core::{Config, Dsn, MigrationError};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct RawConfig {
    source: Dsn,
    target: Dsn,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    data_chunk_size_mb: Option<u64>,
    #[serde(default)]
    data_only: Option<bool>,
    #[serde(default)]
    temp_dir_path: Option<PathBuf>,
    #[serde(default)]
    max_parallel: Option<usize>,
}

/// Reads `path`, dispatches on its extension, and validates the result into a [`Config`].
/// `source`/`target` are mandatory; every other key falls back to the documented default.
pub fn load_config(path: &Path) -> Result<Config, MigrationError> {
    let contents = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let raw: RawConfig = match extension.as_str() {
        "json" => serde_json::from_str(&contents).map_err(|e| MigrationError::ConfigParse {
            format: "JSON",
            message: e.to_string(),
        })?,
        "xml" => quick_xml::de::from_str(&contents).map_err(|e| MigrationError::ConfigParse {
            format: "XML",
            message: e.to_string(),
        })?,
        other => {
            return Err(MigrationError::ConfigParse {
                format: "JSON/XML",
                message: format!(
                    "unrecognized config file extension \"{other}\"; expected .json or .xml"
                ),
            })
        }
    };

    // Undeclared default is sequential (one table at a time), not core-count parallel, so
    // byte-identical runs don't depend on the machine's CPU count.
    let max_parallel = raw
        .max_parallel
        .and_then(NonZeroUsize::new)
        .unwrap_or(NonZeroUsize::new(1).unwrap());

    Ok(Config {
        source: raw.source,
        target: raw.target,
        schema: raw.schema,
        encoding: raw.encoding.unwrap_or_else(|| "UTF-8".to_string()),
        data_chunk_size_mb: raw.data_chunk_size_mb.unwrap_or(Config::DEFAULT_CHUNK_SIZE_MB),
        data_only: raw.data_only.unwrap_or(false),
        temp_dir_path: raw.temp_dir_path,
        max_parallel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn parses_minimal_json_config_with_defaults() {
        let (_dir, path) = write_temp(
            "config.json",
            r#"{
                "source": {"host": "db1", "user": "root", "password": "secret", "database": "shop"},
                "target": {"host": "db2", "user": "postgres", "password": "secret", "database": "shop"}
            }"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.source.host, "db1");
        assert_eq!(config.target.host, "db2");
        assert_eq!(config.encoding, "UTF-8");
        assert_eq!(config.data_chunk_size_mb, Config::DEFAULT_CHUNK_SIZE_MB);
        assert!(!config.data_only);
        assert!(config.schema.is_none());
    }

    #[test]
    fn parses_full_json_config() {
        let (_dir, path) = write_temp(
            "config.json",
            r#"{
                "source": {"host": "db1", "port": 3307, "user": "root", "password": "secret", "database": "shop"},
                "target": {"host": "db2", "user": "postgres", "password": "secret", "database": "shop"},
                "schema": "shop_migrated",
                "encoding": "windows-1252",
                "data_chunk_size_mb": 25,
                "data_only": true,
                "max_parallel": 4
            }"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.source.port, 3307);
        assert_eq!(config.schema.as_deref(), Some("shop_migrated"));
        assert_eq!(config.encoding, "windows-1252");
        assert_eq!(config.data_chunk_size_mb, 25);
        assert!(config.data_only);
        assert_eq!(config.max_parallel.get(), 4);
    }

    #[test]
    fn parses_xml_config() {
        let (_dir, path) = write_temp(
            "config.xml",
            r#"<RawConfig>
                <source><host>db1</host><user>root</user><password>secret</password><database>shop</database></source>
                <target><host>db2</host><user>postgres</user><password>secret</password><database>shop</database></target>
            </RawConfig>"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.source.host, "db1");
        assert_eq!(config.target.database, "shop");
    }

    #[test]
    fn rejects_unknown_extension() {
        let (_dir, path) = write_temp("config.yaml", "source: {}");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, MigrationError::ConfigParse { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let (_dir, path) = write_temp("config.json", "{ not json");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, MigrationError::ConfigParse { format: "JSON", .. }));
    }
}

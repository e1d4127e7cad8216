//! Component A: translates a MySQL column type declaration into a PostgreSQL column type
//! declaration, with correct size/unsigned-promotion rules.

use crate::error::{MigrationError, Result};
use crate::models::MappedType;

/// How the `(...)` length/precision suffix on the MySQL declaration is handled when producing
/// the PostgreSQL spelling.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum SizeHandling {
    /// Width modifiers are display-only in MySQL and meaningless in PostgreSQL; drop them.
    Drop,
    /// Copy the `(...)` suffix verbatim (after the zero-length rewrite).
    Keep,
    /// The PostgreSQL type never carries a length suffix, and neither does the MySQL input in
    /// any form the mapper embeds (text/date/spatial/json/bit/bytea types, and the fixed-width
    /// enum/set and money special cases).
    Fixed,
}

struct TypeMappingEntry {
    normal: &'static str,
    promoted: &'static str,
    size_handling: SizeHandling,
}

const MAPPINGS: &[(&str, TypeMappingEntry)] = &[
    (
        "tinyint",
        TypeMappingEntry {
            normal: "smallint",
            promoted: "int",
            size_handling: SizeHandling::Drop,
        },
    ),
    (
        "smallint",
        TypeMappingEntry {
            normal: "smallint",
            promoted: "int",
            size_handling: SizeHandling::Drop,
        },
    ),
    (
        "year",
        TypeMappingEntry {
            normal: "smallint",
            promoted: "int",
            size_handling: SizeHandling::Drop,
        },
    ),
    (
        "mediumint",
        TypeMappingEntry {
            normal: "int",
            promoted: "bigint",
            size_handling: SizeHandling::Drop,
        },
    ),
    (
        "int",
        TypeMappingEntry {
            normal: "int",
            promoted: "bigint",
            size_handling: SizeHandling::Drop,
        },
    ),
    (
        "bigint",
        TypeMappingEntry {
            normal: "bigint",
            promoted: "bigint",
            size_handling: SizeHandling::Drop,
        },
    ),
    (
        "float",
        TypeMappingEntry {
            normal: "real",
            promoted: "double precision",
            size_handling: SizeHandling::Drop,
        },
    ),
    (
        "double",
        TypeMappingEntry {
            normal: "double precision",
            promoted: "double precision",
            size_handling: SizeHandling::Drop,
        },
    ),
    (
        "decimal",
        TypeMappingEntry {
            normal: "decimal",
            promoted: "decimal",
            size_handling: SizeHandling::Keep,
        },
    ),
    (
        "numeric",
        TypeMappingEntry {
            normal: "numeric",
            promoted: "numeric",
            size_handling: SizeHandling::Keep,
        },
    ),
    (
        "char",
        TypeMappingEntry {
            normal: "character",
            promoted: "character",
            size_handling: SizeHandling::Keep,
        },
    ),
    (
        "varchar",
        TypeMappingEntry {
            normal: "character varying",
            promoted: "character varying",
            size_handling: SizeHandling::Keep,
        },
    ),
    (
        "enum",
        TypeMappingEntry {
            normal: "character varying(255)",
            promoted: "character varying(255)",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "set",
        TypeMappingEntry {
            normal: "character varying(255)",
            promoted: "character varying(255)",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "date",
        TypeMappingEntry {
            normal: "date",
            promoted: "date",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "time",
        TypeMappingEntry {
            normal: "time",
            promoted: "time",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "datetime",
        TypeMappingEntry {
            normal: "timestamp",
            promoted: "timestamp",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "timestamp",
        TypeMappingEntry {
            normal: "timestamp",
            promoted: "timestamp",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "tinytext",
        TypeMappingEntry {
            normal: "text",
            promoted: "text",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "mediumtext",
        TypeMappingEntry {
            normal: "text",
            promoted: "text",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "longtext",
        TypeMappingEntry {
            normal: "text",
            promoted: "text",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "text",
        TypeMappingEntry {
            normal: "text",
            promoted: "text",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "binary",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "varbinary",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "tinyblob",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "mediumblob",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "longblob",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "blob",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "bit",
        TypeMappingEntry {
            normal: "bit varying",
            promoted: "bit varying",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "json",
        TypeMappingEntry {
            normal: "json",
            promoted: "json",
            size_handling: SizeHandling::Fixed,
        },
    ),
    // Spatial types: resolved per Open Question 3 to `bytea`, matching the hex-WKB payload the
    // data pipeline actually sends for these columns (see data_pipeline.rs field shaping).
    (
        "geometry",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "point",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "polygon",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "linestring",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "multipoint",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "multilinestring",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "multipolygon",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
    (
        "geometrycollection",
        TypeMappingEntry {
            normal: "bytea",
            promoted: "bytea",
            size_handling: SizeHandling::Fixed,
        },
    ),
];

fn lookup(base: &str) -> Option<&'static TypeMappingEntry> {
    MAPPINGS
        .iter()
        .find(|(name, _)| *name == base)
        .map(|(_, entry)| entry)
}

/// Maps a MySQL column type declaration (e.g. `int(10) unsigned`, `decimal(10,2)`,
/// `enum('a','b')`) to its PostgreSQL spelling.
pub fn map_type(raw_type: &str) -> Result<MappedType> {
    let raw_type = raw_type.trim();
    let mut tokens = raw_type.split_whitespace();
    let base_declaration = tokens.next().unwrap_or("");
    let modifiers: Vec<&str> = tokens.collect();
    let promote = modifiers
        .iter()
        .any(|m| m.eq_ignore_ascii_case("unsigned") || m.eq_ignore_ascii_case("zerofill"));

    let lower = base_declaration.to_ascii_lowercase();
    let (bare_type, length_suffix) = split_length_suffix(&lower);

    // `decimal(19,2)` is a fixed special case mapping to `money` regardless of the unsigned
    // flag's base entry, per the component design table.
    if bare_type == "decimal" && length_suffix.as_deref() == Some("(19,2)") {
        let pg_type = if promote { "numeric" } else { "money" };
        return Ok(MappedType {
            pg_type: format!("{} ", pg_type.to_ascii_uppercase()),
            has_length_suffix: false,
        });
    }

    let entry = lookup(bare_type)
        .ok_or_else(|| MigrationError::UnsupportedType(raw_type.to_string()))?;

    let chosen = if promote { entry.promoted } else { entry.normal };

    let (pg_type, has_length_suffix) = match entry.size_handling {
        SizeHandling::Drop => (chosen.to_string(), false),
        SizeHandling::Fixed => (chosen.to_string(), false),
        SizeHandling::Keep => match &length_suffix {
            Some(suffix) => {
                let suffix = rewrite_zero_length(suffix);
                (format!("{chosen}{suffix}"), true)
            }
            None => (chosen.to_string(), false),
        },
    };

    Ok(MappedType {
        pg_type: format!("{} ", pg_type.to_ascii_uppercase()),
        has_length_suffix,
    })
}

/// Splits `varchar(255)` into (`"varchar"`, `Some("(255)")`).
fn split_length_suffix(lower: &str) -> (&str, Option<String>) {
    match lower.find('(') {
        Some(idx) => (&lower[..idx], Some(lower[idx..].to_string())),
        None => (lower, None),
    }
}

/// PostgreSQL rejects `character(0)`/`character varying(0)`; rewrite to length 1.
fn rewrite_zero_length(suffix: &str) -> String {
    if suffix == "(0)" {
        "(1)".to_string()
    } else {
        suffix.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totality_non_empty_uppercase_trailing_space() {
        let bases = [
            "tinyint", "smallint", "year", "mediumint", "int", "bigint", "float", "double",
            "decimal(10,2)", "numeric(5,1)", "char(10)", "varchar(255)", "enum('a','b')",
            "set('a','b')", "date", "time", "datetime", "timestamp", "tinytext", "mediumtext",
            "longtext", "text", "binary(16)", "varbinary(16)", "blob", "bit(1)", "json",
            "geometry", "point", "polygon", "linestring",
        ];
        for base in bases {
            for suffix in ["", " unsigned", " zerofill"] {
                let input = format!("{base}{suffix}");
                let mapped = map_type(&input).unwrap_or_else(|e| panic!("{input}: {e}"));
                assert!(!mapped.pg_type.is_empty());
                assert_eq!(mapped.pg_type, mapped.pg_type.to_uppercase());
                assert!(mapped.pg_type.ends_with(' '));
            }
        }
    }

    #[test]
    fn never_returns_zero_length_character_types() {
        assert!(!map_type("char(0)").unwrap().pg_type.contains("(0)"));
        assert!(!map_type("varchar(0)").unwrap().pg_type.contains("(0)"));
        assert!(map_type("char(0)").unwrap().pg_type.contains("(1)"));
        assert!(map_type("varchar(0)").unwrap().pg_type.contains("(1)"));
    }

    #[test]
    fn enum_and_set_collapse_to_varchar_255_ignoring_values() {
        let enum_mapped = map_type("enum('x','y')").unwrap();
        let set_mapped = map_type("set('x','y')").unwrap();
        assert_eq!(enum_mapped.pg_type.trim(), "CHARACTER VARYING(255)");
        assert_eq!(set_mapped.pg_type.trim(), "CHARACTER VARYING(255)");
        assert!(!enum_mapped.pg_type.contains('\''));
    }

    #[test]
    fn unsigned_promotes_one_width_wider() {
        assert_eq!(map_type("int unsigned").unwrap().pg_type.trim(), "BIGINT");
        assert_eq!(map_type("int").unwrap().pg_type.trim(), "INT");
        assert_eq!(
            map_type("tinyint unsigned").unwrap().pg_type.trim(),
            "INT"
        );
        assert_eq!(map_type("tinyint").unwrap().pg_type.trim(), "SMALLINT");
    }

    #[test]
    fn zerofill_also_promotes() {
        assert_eq!(
            map_type("int(10) zerofill").unwrap().pg_type.trim(),
            "BIGINT"
        );
    }

    #[test]
    fn drops_display_width_on_integers() {
        let mapped = map_type("int(11)").unwrap();
        assert!(!mapped.pg_type.contains('('));
    }

    #[test]
    fn keeps_decimal_precision_and_scale() {
        let mapped = map_type("decimal(10,2)").unwrap();
        assert_eq!(mapped.pg_type.trim(), "DECIMAL(10,2)");
        assert!(mapped.has_length_suffix);
    }

    #[test]
    fn decimal_19_2_exact_match_becomes_money() {
        assert_eq!(map_type("decimal(19,2)").unwrap().pg_type.trim(), "MONEY");
        assert_eq!(
            map_type("decimal(19,2) unsigned").unwrap().pg_type.trim(),
            "NUMERIC"
        );
        // Not an exact match -> ordinary decimal handling.
        assert_eq!(map_type("decimal(19,3)").unwrap().pg_type.trim(), "DECIMAL(19,3)");
    }

    #[test]
    fn unknown_base_type_is_unsupported() {
        let err = map_type("frobnicate(1)").unwrap_err();
        assert!(matches!(err, MigrationError::UnsupportedType(_)));
    }

    #[test]
    fn spatial_types_map_to_bytea() {
        for t in ["geometry", "point", "polygon", "linestring"] {
            assert_eq!(map_type(t).unwrap().pg_type.trim(), "BYTEA");
        }
    }

    #[test]
    fn blob_and_binary_family_map_to_bytea() {
        for t in ["binary(16)", "varbinary(255)", "blob", "tinyblob", "mediumblob", "longblob"] {
            assert_eq!(map_type(t).unwrap().pg_type.trim(), "BYTEA");
        }
    }

    #[test]
    fn bit_maps_to_bit_varying() {
        assert_eq!(map_type("bit(1)").unwrap().pg_type.trim(), "BIT VARYING");
        assert_eq!(
            map_type("bit(8) unsigned").unwrap().pg_type.trim(),
            "BIT VARYING"
        );
    }
}

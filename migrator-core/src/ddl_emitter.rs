//! Component E: for a given source table, builds the `CREATE TABLE`, comment, deferred DDL
//! (NOT NULL/DEFAULT/ENUM check/comment/sequence/index) and foreign-key statements.

use crate::helpers::StringExt;
use crate::models::{Column, ForeignKey, Index, SourceTable};
use crate::quoting::{quote_ident, quote_ident_list, quote_literal, quote_qualified};
use crate::type_mapper::map_type;
use crate::Result;

/// `CREATE TABLE "schema"."table" (...)`, columns in `SHOW FULL COLUMNS` order. The only
/// statement in the emitter whose failure is fatal for the whole run.
pub fn build_create_table(schema: &str, table: &SourceTable) -> Result<String> {
    let mut column_defs = Vec::with_capacity(table.columns.len());
    for column in &table.columns {
        let mapped = map_type(&column.raw_type)?;
        column_defs.push(format!(
            "    {} {}",
            quote_ident(&column.field),
            mapped.pg_type.trim_end()
        ));
    }

    let mut sql = String::new();
    sql.push_str(&format!(
        "CREATE TABLE {} (\n",
        quote_qualified(schema, &table.name)
    ));
    sql.push_join(",\n", column_defs);
    sql.push_str("\n);");
    Ok(sql)
}

/// `COMMENT ON TABLE ...`, when `SHOW TABLE STATUS` reported one.
pub fn build_table_comment(schema: &str, table: &SourceTable) -> Option<String> {
    table.comment.as_ref().map(|comment| {
        format!(
            "COMMENT ON TABLE {} IS {};",
            quote_qualified(schema, &table.name),
            quote_literal(comment)
        )
    })
}

/// One deferred-DDL statement, labeled for error reporting and independent continuation:
/// a single statement's failure never blocks the others.
#[derive(Debug, Clone)]
pub struct DeferredStatement {
    pub sql: String,
}

/// Builds every deferred-DDL statement for a table (§4.E steps 3-5): NOT NULL, DEFAULT, ENUM
/// check, column comments, the auto-increment sequence, and indexes. Foreign keys are built
/// separately by [`build_foreign_key_statements`] since they run in the later global phase.
pub fn build_deferred_statements(schema: &str, table: &SourceTable) -> Vec<DeferredStatement> {
    let mut statements = Vec::new();
    let qualified_table = quote_qualified(schema, &table.name);

    for column in &table.columns {
        let quoted_col = quote_ident(&column.field);

        if !column.nullable {
            statements.push(DeferredStatement {
                sql: format!(
                    "ALTER TABLE {qualified_table} ALTER COLUMN {quoted_col} SET NOT NULL;"
                ),
            });
        }

        if let Some(default) = &column.default {
            let expr = map_default_expr(default, column);
            statements.push(DeferredStatement {
                sql: format!(
                    "ALTER TABLE {qualified_table} ALTER COLUMN {quoted_col} SET DEFAULT {expr};"
                ),
            });
        }

        // `set` columns legally hold comma-joined combinations of their declared values
        // (e.g. `'a,b'`), so only `enum` gets the single-value `IN (...)` check.
        if column.base_type() == "enum" {
            if let Some(value_list) = column.enum_value_list() {
                statements.push(DeferredStatement {
                    sql: format!(
                        "ALTER TABLE {qualified_table} ADD CHECK ({quoted_col} IN ({value_list}));"
                    ),
                });
            }
        }

        if let Some(comment) = &column.comment {
            statements.push(DeferredStatement {
                sql: format!(
                    "COMMENT ON COLUMN {qualified_table}.{quoted_col} IS {};",
                    quote_literal(comment)
                ),
            });
        }
    }

    if let Some(auto_increment_col) = table.auto_increment_column() {
        statements.extend(build_sequence_statements(schema, table, auto_increment_col));
    }

    statements.extend(build_index_statements(schema, table));

    statements
}

/// `CURRENT_TIMESTAMP`-style keywords, mapped to themselves.
const SELF_MAPPED_DEFAULTS: &[&str] = &[
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "LOCALTIME",
    "LOCALTIMESTAMP",
];

const ZERO_DATE_DEFAULTS: &[&str] = &["0000-00-00", "0000-00-00 00:00:00"];

/// Maps a MySQL column default expression to its PostgreSQL spelling, per the fixed table in
/// §4.E step 3.
fn map_default_expr(raw_default: &str, column: &Column) -> String {
    let trimmed = raw_default.trim();
    let upper = trimmed.to_ascii_uppercase();

    if upper.eq_ignore_ascii_case("NULL") {
        return "NULL".to_string();
    }

    if SELF_MAPPED_DEFAULTS.contains(&upper.as_str()) {
        return upper;
    }

    if ZERO_DATE_DEFAULTS.contains(&trimmed) {
        return "'-INFINITY'".to_string();
    }

    if matches!(upper.as_str(), "UTC_DATE" | "UTC_TIME" | "UTC_TIMESTAMP") {
        return format!("({upper} AT TIME ZONE 'UTC')");
    }

    if column.base_type() == "bit" {
        if let Some(bits) = trimmed
            .strip_prefix("b'")
            .and_then(|rest| rest.strip_suffix('\''))
        {
            return format!("b'{bits}'::bit");
        }
    }

    if is_numeric_literal(trimmed) {
        return trimmed.to_string();
    }

    quote_literal(trimmed)
}

fn is_numeric_literal(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == '+')
}

fn build_sequence_statements(
    schema: &str,
    table: &SourceTable,
    auto_increment_col: &Column,
) -> Vec<DeferredStatement> {
    let qualified_table = quote_qualified(schema, &table.name);
    let quoted_col = quote_ident(&auto_increment_col.field);
    let seq_name = format!("{}_{}_seq", table.name, auto_increment_col.field);
    let qualified_seq = quote_qualified(schema, &seq_name);

    vec![
        DeferredStatement {
            sql: format!("CREATE SEQUENCE {qualified_seq};"),
        },
        DeferredStatement {
            sql: format!(
                "ALTER TABLE {qualified_table} ALTER COLUMN {quoted_col} SET DEFAULT NEXTVAL({});",
                quote_literal(&qualified_seq)
            ),
        },
        DeferredStatement {
            sql: format!(
                "ALTER SEQUENCE {qualified_seq} OWNED BY {qualified_table}.{quoted_col};"
            ),
        },
        DeferredStatement {
            sql: format!(
                "SELECT SETVAL({}, COALESCE((SELECT MAX({quoted_col}) FROM {qualified_table}), 1), \
                 (SELECT MAX({quoted_col}) FROM {qualified_table}) IS NOT NULL);",
                quote_literal(&qualified_seq)
            ),
        },
    ]
}

fn build_index_statements(schema: &str, table: &SourceTable) -> Vec<DeferredStatement> {
    let qualified_table = quote_qualified(schema, &table.name);
    let mut statements = Vec::with_capacity(table.indexes.len());
    let mut counter = 0u32;

    for index in &table.indexes {
        if index.is_primary() {
            statements.push(DeferredStatement {
                sql: format!(
                    "ALTER TABLE {qualified_table} ADD PRIMARY KEY ({});",
                    quote_ident_list(&index.columns)
                ),
            });
            continue;
        }

        counter += 1;
        let first_col = index.columns.first().map(String::as_str).unwrap_or("col");
        let index_name = format!("{}_{}_{}{}_idx", schema, table.name, first_col, counter);

        if index.is_unique {
            statements.push(DeferredStatement {
                sql: format!(
                    "ALTER TABLE {qualified_table} ADD CONSTRAINT {} UNIQUE ({});",
                    quote_ident(&index_name),
                    quote_ident_list(&index.columns)
                ),
            });
        } else {
            statements.push(DeferredStatement {
                sql: format!(
                    "CREATE INDEX {} ON {qualified_table} USING {} ({});",
                    quote_ident(&index_name),
                    index.method.to_postgres_using(),
                    quote_ident_list(&index.columns)
                ),
            });
        }
    }

    statements
}

/// Builds the `ALTER TABLE ... ADD FOREIGN KEY ...` statement for each foreign key. Run only in
/// the global foreign-key phase, after every table has finished its deferred DDL.
pub fn build_foreign_key_statements(schema: &str, table: &SourceTable) -> Vec<(ForeignKey, String)> {
    table
        .foreign_keys
        .iter()
        .map(|fk| {
            let sql = format!(
                "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {};",
                quote_qualified(schema, &table.name),
                quote_ident_list(&fk.columns),
                quote_qualified(schema, &fk.ref_table),
                quote_ident_list(&fk.ref_columns),
                fk.on_update.as_sql(),
                fk.on_delete.as_sql(),
            );
            (fk.clone(), sql)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IndexMethod, TableKind};

    fn column(field: &str, raw_type: &str, nullable: bool) -> Column {
        Column {
            field: field.to_string(),
            raw_type: raw_type.to_string(),
            nullable,
            default: None,
            extra: String::new(),
            comment: None,
        }
    }

    fn table(columns: Vec<Column>) -> SourceTable {
        SourceTable {
            name: "t".to_string(),
            kind: TableKind::BaseTable,
            columns,
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            comment: None,
            row_count: 0,
            size_mb: 1,
        }
    }

    #[test]
    fn builds_create_table_with_mapped_types() {
        let t = table(vec![
            column("a", "tinyint unsigned", false),
            column("b", "varchar(10)", true),
        ]);
        let sql = build_create_table("shop", &t).unwrap();
        assert!(sql.starts_with("CREATE TABLE \"shop\".\"t\" (\n"));
        assert!(sql.contains("\"a\" INT"));
        assert!(sql.contains("\"b\" CHARACTER VARYING(10)"));
        assert!(sql.ends_with(");"));
    }

    #[test]
    fn not_null_generated_for_non_nullable_column() {
        let t = table(vec![column("a", "int", false)]);
        let statements = build_deferred_statements("shop", &t);
        assert!(statements
            .iter()
            .any(|s| s.sql.contains("SET NOT NULL")));
    }

    #[test]
    fn zero_date_default_maps_to_infinity() {
        let mut col = column("d", "datetime", true);
        col.default = Some("0000-00-00 00:00:00".to_string());
        let t = table(vec![col]);
        let statements = build_deferred_statements("shop", &t);
        assert!(statements.iter().any(|s| s.sql.contains("'-INFINITY'")));
    }

    #[test]
    fn enum_default_adds_check_constraint() {
        let mut col = column("c", "enum('a','b')", false);
        col.default = Some("a".to_string());
        let t = table(vec![col]);
        let statements = build_deferred_statements("shop", &t);
        assert!(statements
            .iter()
            .any(|s| s.sql.contains("CHECK") && s.sql.contains("IN ('a','b')")));
    }

    #[test]
    fn set_column_gets_no_check_constraint() {
        let col = column("tags", "set('a','b')", true);
        let t = table(vec![col]);
        let statements = build_deferred_statements("shop", &t);
        assert!(!statements.iter().any(|s| s.sql.contains("CHECK")));
    }

    #[test]
    fn auto_increment_column_gets_sequence_statements() {
        let mut col = column("id", "int", false);
        col.extra = "auto_increment".to_string();
        let t = table(vec![col]);
        let statements = build_deferred_statements("shop", &t);
        assert!(statements.iter().any(|s| s.sql.contains("CREATE SEQUENCE")));
        assert!(statements.iter().any(|s| s.sql.contains("NEXTVAL")));
        assert!(statements.iter().any(|s| s.sql.contains("OWNED BY")));
        assert!(statements.iter().any(|s| s.sql.contains("SETVAL")));
    }

    #[test]
    fn primary_key_index_becomes_add_primary_key() {
        let mut t = table(vec![column("id", "int", false)]);
        t.indexes.push(Index {
            key_name: "PRIMARY".to_string(),
            is_unique: true,
            method: IndexMethod::BTree,
            columns: vec!["id".to_string()],
        });
        let statements = build_deferred_statements("shop", &t);
        assert!(statements.iter().any(|s| s.sql.contains("ADD PRIMARY KEY")));
    }

    #[test]
    fn spatial_index_uses_gist() {
        let mut t = table(vec![column("geo", "geometry", true)]);
        t.indexes.push(Index {
            key_name: "geo_idx".to_string(),
            is_unique: false,
            method: IndexMethod::Spatial,
            columns: vec!["geo".to_string()],
        });
        let statements = build_deferred_statements("shop", &t);
        assert!(statements.iter().any(|s| s.sql.contains("USING gist")));
    }

    #[test]
    fn foreign_key_statement_shape() {
        let mut t = table(vec![column("pid", "int", true)]);
        t.foreign_keys.push(ForeignKey {
            constraint_name: "fk_pid".to_string(),
            columns: vec!["pid".to_string()],
            ref_table: "parent".to_string(),
            ref_columns: vec!["id".to_string()],
            on_update: crate::models::ReferentialAction::NoAction,
            on_delete: crate::models::ReferentialAction::Cascade,
        });
        let statements = build_foreign_key_statements("shop", &t);
        assert_eq!(statements.len(), 1);
        let (_, sql) = &statements[0];
        assert!(sql.contains("REFERENCES \"shop\".\"parent\" (\"id\")"));
        assert!(sql.contains("ON DELETE CASCADE"));
    }
}

//! Identifier and literal quoting for the statements the DDL emitter and row encoder produce.
//!
//! Every destination identifier the engine emits is always double-quoted (per the DDL shapes in
//! the component design, e.g. `CREATE TABLE "schema"."table"`), so unlike a general-purpose SQL
//! formatter this module does not try to detect "safe" bare identifiers - it just quotes and
//! escapes everything, the same way `schema."table"` literals are built throughout the DDL
//! emitter.

/// Quotes a single PostgreSQL identifier, escaping embedded double quotes by doubling them.
pub fn quote_ident(identifier: impl AsRef<str>) -> String {
    let identifier = identifier.as_ref();
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

/// Quotes a schema-qualified identifier as `"schema"."name"`.
pub fn quote_qualified(schema: impl AsRef<str>, name: impl AsRef<str>) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

/// Quotes a comma-separated list of identifiers, preserving order.
pub fn quote_ident_list<S: AsRef<str>>(identifiers: impl IntoIterator<Item = S>) -> String {
    identifiers
        .into_iter()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Quotes a string value for use as a SQL literal, escaping embedded single quotes by doubling
/// them.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_simple_identifier() {
        assert_eq!(quote_ident("users"), "\"users\"");
    }

    #[test]
    fn escapes_embedded_quote() {
        assert_eq!(quote_ident("my\"table"), "\"my\"\"table\"");
    }

    #[test]
    fn qualified_name() {
        assert_eq!(quote_qualified("db", "users"), "\"db\".\"users\"");
    }

    #[test]
    fn ident_list() {
        assert_eq!(quote_ident_list(["a", "b", "c"]), "\"a\", \"b\", \"c\"");
    }

    #[test]
    fn literal_escapes_single_quote() {
        assert_eq!(quote_literal("it's"), "'it''s'");
    }
}

//! Component B: best-effort port of a MySQL `CREATE VIEW` body to PostgreSQL dialect.
//!
//! MySQL-only syntax inside a view body (`GROUP_CONCAT`, `IF()`, and the like) is not rewritten;
//! such views are expected to fail when the resulting DDL is issued, and the caller is
//! responsible for routing that failure to `not_created_views/<name>.sql` rather than aborting
//! the run (see orchestrator.rs).

/// Rewrites a MySQL `SHOW CREATE VIEW` definition into `CREATE VIEW "<schema>"."<name>" AS ...`.
///
/// `raw_definition` is the verbatim second column of `SHOW CREATE VIEW`, e.g.:
/// `` CREATE ALGORITHM=UNDEFINED DEFINER=`root`@`%` SQL SECURITY DEFINER VIEW `active_users` AS select `u`.`id` AS `id` from `users` `u` where (`u`.`active` = 1) ``
pub fn rewrite_view(schema: &str, view_name: &str, raw_definition: &str) -> String {
    let body = strip_header(raw_definition);
    let body = requote_identifiers(body);
    let body = qualify_table_references(&body, schema);

    format!(
        "CREATE VIEW {}.{} AS {}",
        crate::quoting::quote_ident(schema),
        crate::quoting::quote_ident(view_name),
        body.trim()
    )
}

/// Strips MySQL's `CREATE ALGORITHM=... DEFINER=... SQL SECURITY ... VIEW \`name\`` prefix,
/// returning whatever follows the first top-level `AS`.
fn strip_header(raw: &str) -> &str {
    let upper = raw.to_ascii_uppercase();
    match upper.find(" AS ") {
        Some(idx) => &raw[idx + 4..],
        None => raw,
    }
}

/// Replaces backtick identifier quoting with double quotes. MySQL never embeds a literal
/// backtick inside a backtick-quoted identifier without doubling it, so the rule mirrors
/// PostgreSQL's own doubling convention.
fn requote_identifiers(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '`' {
            if chars.peek() == Some(&'`') {
                out.push('`');
                chars.next();
            } else {
                out.push('"');
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Best-effort: qualifies bare double-quoted table references with the destination schema.
/// This only handles the common `FROM "table"` / `JOIN "table"` shape; it is not a SQL parser.
fn qualify_table_references(body: &str, schema: &str) -> String {
    let quoted_schema = crate::quoting::quote_ident(schema);
    let lower = body.to_ascii_lowercase();
    let mut out = String::with_capacity(body.len());
    let mut cursor = 0usize;

    while cursor < body.len() {
        let next = ["from", "join"]
            .iter()
            .filter_map(|kw| find_keyword(&lower[cursor..], kw).map(|idx| idx + cursor))
            .min();

        let Some(idx) = next else {
            out.push_str(&body[cursor..]);
            break;
        };

        let keyword_end = idx + 4; // "from" and "join" are both 4 bytes
        out.push_str(&body[cursor..keyword_end]);
        cursor = keyword_end;

        let after = &body[cursor..];
        let leading_ws = after.len() - after.trim_start().len();
        out.push_str(&after[..leading_ws]);
        cursor += leading_ws;

        let remainder = &body[cursor..];
        if let Some(stripped) = remainder.strip_prefix('"') {
            if let Some(end) = stripped.find('"') {
                let ident = &remainder[..end + 2];
                if !remainder[end + 2..].starts_with('.') {
                    out.push_str(&quoted_schema);
                    out.push('.');
                }
                out.push_str(ident);
                cursor += end + 2;
            }
        }
    }
    out
}

fn find_keyword(haystack: &str, keyword: &str) -> Option<usize> {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(keyword) {
        let idx = start + pos;
        let before_ok = idx == 0
            || (!haystack.as_bytes()[idx - 1].is_ascii_alphanumeric()
                && haystack.as_bytes()[idx - 1] != b'_');
        let after_idx = idx + keyword.len();
        let after_ok = after_idx >= haystack.len()
            || (!haystack.as_bytes()[after_idx].is_ascii_alphanumeric()
                && haystack.as_bytes()[after_idx] != b'_');
        if before_ok && after_ok {
            return Some(idx);
        }
        start = idx + keyword.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_algorithm_definer_security_prefix() {
        let raw = "CREATE ALGORITHM=UNDEFINED DEFINER=`root`@`%` SQL SECURITY DEFINER VIEW `v` AS select `id` from `t`";
        let out = rewrite_view("shop", "v", raw);
        assert!(out.starts_with(r#"CREATE VIEW "shop"."v" AS"#));
        assert!(!out.contains("ALGORITHM"));
        assert!(!out.contains("DEFINER"));
    }

    #[test]
    fn replaces_backtick_quoting_with_double_quotes() {
        let raw = "CREATE VIEW `v` AS select `u`.`id` from `users` `u`";
        let out = rewrite_view("shop", "v", raw);
        assert!(!out.contains('`'));
        assert!(out.contains("\"u\".\"id\""));
    }

    #[test]
    fn qualifies_bare_table_reference_in_from_clause() {
        let raw = "CREATE VIEW `v` AS select `id` from `users`";
        let out = rewrite_view("shop", "v", raw);
        assert!(out.contains(r#"from "shop"."users""#));
    }

    #[test]
    fn does_not_double_qualify_already_qualified_reference() {
        let raw = r#"CREATE VIEW `v` AS select "id" from "shop"."users""#;
        let out = rewrite_view("shop", "v", raw);
        assert_eq!(out.matches(r#""shop"."shop""#).count(), 0);
    }
}

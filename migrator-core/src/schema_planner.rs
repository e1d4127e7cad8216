//! Component D: picks a collision-free destination schema name and creates it.

use crate::postgres_client_wrapper::PostgresClientWrapper;
use crate::quoting::quote_ident;
use crate::Result;
use std::collections::HashSet;

/// Resolves the destination schema name per the invariant in §3.1:
/// - an operator-supplied name that already exists is reused as-is (append into it);
/// - an operator-supplied name that doesn't exist is created;
/// - with no operator-supplied name, the source database name is probed, appending `_1`, `_2`,
///   … until a free slot is found.
pub async fn resolve_schema_name(
    destination: &PostgresClientWrapper,
    configured_schema: Option<&str>,
    source_database_name: &str,
) -> Result<String> {
    let existing = existing_schema_names(destination).await?;

    let name = match configured_schema {
        Some(name) => name.to_string(),
        None => first_free_name(source_database_name, &existing),
    };

    if !existing.contains(&name) {
        destination
            .execute_non_query(&format!("create schema {};", quote_ident(&name)))
            .await?;
    }

    Ok(name)
}

async fn existing_schema_names(destination: &PostgresClientWrapper) -> Result<HashSet<String>> {
    let names: Vec<String> = destination
        .get_single_results::<String>("select schema_name from information_schema.schemata;")
        .await?;
    Ok(names.into_iter().collect())
}

/// Probes `base`, `base_1`, `base_2`, … for the first name absent from `existing`.
fn first_free_name(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }

    let mut n = 1u32;
    loop {
        let candidate = format!("{base}_{n}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_base_name_wins_outright() {
        let existing = HashSet::new();
        assert_eq!(first_free_name("shop", &existing), "shop");
    }

    #[test]
    fn picks_first_free_suffix_not_highest_plus_one() {
        let existing: HashSet<String> = ["db", "db_1", "db_3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(first_free_name("db", &existing), "db_2");
    }

    #[test]
    fn skips_every_taken_suffix_in_order() {
        let existing: HashSet<String> = ["shop", "shop_1", "shop_2", "shop_3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(first_free_name("shop", &existing), "shop_4");
    }
}

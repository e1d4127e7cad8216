/// The method backing a MySQL index, as reported in `SHOW INDEX`'s `Index_type` column.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IndexMethod {
    BTree,
    Hash,
    Spatial,
    Fulltext,
}

impl IndexMethod {
    pub fn from_mysql(index_type: &str) -> Self {
        match index_type.to_ascii_uppercase().as_str() {
            "HASH" => IndexMethod::Hash,
            "SPATIAL" => IndexMethod::Spatial,
            "FULLTEXT" => IndexMethod::Fulltext,
            _ => IndexMethod::BTree,
        }
    }

    /// The PostgreSQL access method to use with `USING`, per the best-effort mapping in the
    /// component design: `SPATIAL -> GIST`, `FULLTEXT -> GIN`, everything else passes through.
    pub fn to_postgres_using(self) -> &'static str {
        match self {
            IndexMethod::BTree => "btree",
            IndexMethod::Hash => "hash",
            IndexMethod::Spatial => "gist",
            IndexMethod::Fulltext => "gin",
        }
    }
}

/// A MySQL index, collapsed from the (possibly multiple) `SHOW INDEX` rows that share a
/// `Key_name` into one entry with ordered columns.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Index {
    pub key_name: String,
    pub is_unique: bool,
    pub method: IndexMethod,
    /// Columns in `Seq_in_index` order.
    pub columns: Vec<String>,
}

impl Index {
    pub fn is_primary(&self) -> bool {
        self.key_name == "PRIMARY"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_spatial_to_gist_and_fulltext_to_gin() {
        assert_eq!(IndexMethod::Spatial.to_postgres_using(), "gist");
        assert_eq!(IndexMethod::Fulltext.to_postgres_using(), "gin");
        assert_eq!(IndexMethod::BTree.to_postgres_using(), "btree");
        assert_eq!(IndexMethod::Hash.to_postgres_using(), "hash");
    }

    #[test]
    fn from_mysql_index_type_is_case_insensitive() {
        assert_eq!(IndexMethod::from_mysql("spatial"), IndexMethod::Spatial);
        assert_eq!(IndexMethod::from_mysql("FULLTEXT"), IndexMethod::Fulltext);
        assert_eq!(IndexMethod::from_mysql("BTREE"), IndexMethod::BTree);
    }

    #[test]
    fn primary_key_detection() {
        let idx = Index {
            key_name: "PRIMARY".to_string(),
            is_unique: true,
            method: IndexMethod::BTree,
            columns: vec!["id".to_string()],
        };
        assert!(idx.is_primary());
    }
}

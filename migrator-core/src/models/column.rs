/// A single column as reported by `SHOW FULL COLUMNS`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Column {
    /// The column name (`Field`).
    pub field: String,
    /// The full MySQL type declaration, including length/precision and `unsigned`/`zerofill`
    /// modifiers, e.g. `int(10) unsigned` or `decimal(10,2)`.
    pub raw_type: String,
    /// `Null == "NO"` in `SHOW FULL COLUMNS` becomes `nullable == false`.
    pub nullable: bool,
    /// The raw MySQL `Default` value, if any.
    pub default: Option<String>,
    /// The `Extra` field, e.g. `auto_increment`.
    pub extra: String,
    /// The column comment, if non-empty.
    pub comment: Option<String>,
}

impl Column {
    /// Whether this column is the table's (at most one) auto-increment column.
    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_ascii_lowercase().contains("auto_increment")
    }

    /// The bare MySQL base type, lowercased, with any `(...)` suffix and unsigned/zerofill
    /// modifiers stripped - used to detect enum/spatial/bit columns during data-pipeline field
    /// shaping.
    pub fn base_type(&self) -> &str {
        let first_token = self.raw_type.split_whitespace().next().unwrap_or("");
        match first_token.find('(') {
            Some(idx) => &first_token[..idx],
            None => first_token,
        }
    }

    /// Extracts the comma-separated quoted value list out of `enum('a','b')` / `set('a','b')`,
    /// verbatim, for splicing into a `CHECK (... IN (...))` constraint.
    pub fn enum_value_list(&self) -> Option<&str> {
        let open = self.raw_type.find('(')?;
        let close = self.raw_type.rfind(')')?;
        if close <= open {
            return None;
        }
        Some(&self.raw_type[open + 1..close])
    }
}

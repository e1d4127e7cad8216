use super::{Column, ForeignKey, Index};

/// Whether a discovered object is a base table or a view, per `SHOW FULL TABLES`'s second
/// column.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TableKind {
    BaseTable,
    View,
}

/// A source table (or view, prior to being split off into [`crate::models::ViewDefinition`])
/// discovered during the structure phase. Populated once during discovery and treated as
/// immutable thereafter.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub name: String,
    pub kind: TableKind,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
    pub comment: Option<String>,
    pub row_count: u64,
    pub size_mb: u64,
}

impl SourceTable {
    /// The (at most one) auto-increment column, if present.
    pub fn auto_increment_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_auto_increment())
    }
}

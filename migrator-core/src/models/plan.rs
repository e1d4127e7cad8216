use super::{SourceTable, ViewDefinition};

/// The result of the schema-planning phase: the destination schema name to use, and the
/// discovered tables/views to migrate into it.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub target_schema_name: String,
    pub tables: Vec<SourceTable>,
    pub views: Vec<ViewDefinition>,
    pub chunk_target_mb: u64,
}

/// The result of mapping a MySQL column type declaration through the type mapper.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MappedType {
    /// The PostgreSQL type spelling, uppercased, with a trailing space, ready to splice into a
    /// `CREATE TABLE` column definition.
    pub pg_type: String,
    /// Whether `pg_type` carries a `(...)` length/precision suffix copied from the source.
    pub has_length_suffix: bool,
}

/// A source view, as reported by `SHOW CREATE VIEW`.
#[derive(Debug, Clone)]
pub struct ViewDefinition {
    pub name: String,
    /// The raw MySQL `Create View` text (second column of `SHOW CREATE VIEW`).
    pub raw_definition: String,
}

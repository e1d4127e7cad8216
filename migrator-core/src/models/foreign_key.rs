/// A foreign key, discovered by joining `KEY_COLUMN_USAGE` against `REFERENTIAL_CONSTRAINTS` and
/// grouped by constraint name, preserving column order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ForeignKey {
    pub constraint_name: String,
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    pub on_update: ReferentialAction,
    pub on_delete: ReferentialAction,
}

/// `ON UPDATE`/`ON DELETE` rules. MySQL and PostgreSQL spell these identically.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    pub fn from_mysql(rule: &str) -> Self {
        match rule.to_ascii_uppercase().as_str() {
            "CASCADE" => ReferentialAction::Cascade,
            "SET NULL" => ReferentialAction::SetNull,
            "SET DEFAULT" => ReferentialAction::SetDefault,
            "RESTRICT" => ReferentialAction::Restrict,
            _ => ReferentialAction::NoAction,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_rules() {
        for rule in ["CASCADE", "SET NULL", "SET DEFAULT", "RESTRICT", "NO ACTION"] {
            assert_eq!(ReferentialAction::from_mysql(rule).as_sql(), rule);
        }
    }

    #[test]
    fn unknown_rule_defaults_to_no_action() {
        assert_eq!(ReferentialAction::from_mysql("bogus").as_sql(), "NO ACTION");
    }
}

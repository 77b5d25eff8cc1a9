use crate::condition::OperatorTable;

pub const DEFAULT_NAME: &str = "DataBase";

/// Settings fixed when a [crate::Database] is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Name written at the top of saved files.
    pub name: String,
    /// Precedence of `NOT`, `AND` and `OR` in `WHERE` clauses.
    pub operators: OperatorTable,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            operators: OperatorTable::default(),
        }
    }
}

impl DatabaseConfig {
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

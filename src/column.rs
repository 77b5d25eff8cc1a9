use crate::data_type::DataType;
use crate::value::Value;

/// Minimum display width of a column, so that `NULL` always fits.
pub const NULL_WIDTH: usize = 4;

/// Reference from a column to a column of another table.
///
/// Only checked for type compatibility when the table is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Name of the referenced table.
    pub table: String,
    /// Position of the referenced column in that table.
    pub column: usize,
}

/// Metadata describing one column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// The name of the column.
    pub name: String,
    /// The table this column was declared in. Join results keep the origin of
    /// every merged column so that `table.column` names stay resolvable.
    pub table: String,
    /// The declared data type of the column.
    pub data_type: DataType,
    /// Whether `NULL` is rejected in this column.
    pub not_null: bool,
    /// Display width: grows to the widest name or value ever stored, never shrinks.
    pub width: usize,
    pub foreign_key: Option<ForeignKey>,
}

impl ColumnInfo {
    /// Creates the metadata of a fresh column, its width fitting its name and `NULL`.
    pub fn new(name: String, table: String, data_type: DataType, not_null: bool) -> Self {
        let width = name.chars().count().max(NULL_WIDTH);
        Self {
            name,
            table,
            data_type,
            not_null,
            width,
            foreign_key: None,
        }
    }

    /// Widens the column so that `value` fits when printed.
    pub fn fit(&mut self, value: &Value) {
        self.width = self.width.max(value.display_width());
    }

    /// Returns `true` if `name` designates this column, either bare (`age`)
    /// or qualified by its table (`Students.age`).
    pub fn is_named(&self, name: &str) -> bool {
        match name.split_once('.') {
            Some((table, column)) => table == self.table && column == self.name,
            None => name == self.name,
        }
    }
}

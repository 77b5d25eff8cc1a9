use crate::ColumnDef;
use crate::condition::Condition;

#[derive(Debug, PartialEq)]
pub enum Statement {
    CreateTable(CreateTable),
    DropTable(String),
    InsertInto(InsertInto),
    Select(Select),
    Delete(Delete),
    Update(Update),
}

/// `FOREIGN KEY(column) REFERENCES ref_table(ref_column)`
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDef {
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
}

#[derive(Debug, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub foreign_keys: Vec<ForeignKeyDef>,
}

#[derive(Debug, PartialEq)]
pub struct InsertInto {
    pub table: String,
    pub columns: Option<Vec<String>>,
    /// Literal texts, quotes removed.
    pub values: Vec<String>,
}

#[derive(Debug, PartialEq)]
pub enum ColumnsSelect {
    Star,
    ColumnsNames(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

#[derive(Debug, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    /// The two sides of `ON a.x = b.y`, as `(table, column)` pairs.
    pub on: ((String, String), (String, String)),
}

#[derive(Debug, PartialEq)]
pub struct Select {
    pub columns: ColumnsSelect,
    pub table: String,
    pub join: Option<JoinClause>,
    pub where_clause: Condition,
}

#[derive(Debug, PartialEq)]
pub struct Delete {
    pub table: String,
    pub where_clause: Condition,
}

#[derive(Debug, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<(String, String)>,
    pub where_clause: Condition,
}

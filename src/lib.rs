pub mod ast;
pub mod column;
pub mod condition;
pub mod config;
pub mod data_type;
pub mod database;
pub mod error;
pub mod eval;
pub mod join;
pub mod parser;
pub mod persist;
pub mod table;
pub mod tokenizer;
pub mod value;

pub use column::ColumnInfo;
pub use config::DatabaseConfig;
pub use data_type::DataType;
pub use database::{Database, Outcome, QueryResult};
pub use error::{DbError, Result};
pub use table::{ColumnDef, Schema, Table};
pub use value::Value;

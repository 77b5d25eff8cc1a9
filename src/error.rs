//! Error types for the minidb engine

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    /// The statement or a literal does not match the required grammar.
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// The statement is well formed but semantically invalid
    /// (unknown table or column, constraint violation, ...).
    #[error("Logic error: {0}")]
    Logic(String),

    #[error("Cannot use file {path:?}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupted database file at line {line}: {reason}")]
    CorruptFile { line: usize, reason: String },
}

impl DbError {
    pub(crate) fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    pub(crate) fn logic(msg: impl Into<String>) -> Self {
        Self::Logic(msg.into())
    }

    /// Returns `true` for errors raised by a statement itself, as opposed to
    /// errors raised while reading or writing a database file.
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::Syntax(_) | Self::Logic(_))
    }
}

use std::fmt;
use std::str::FromStr;

use crate::error::{DbError, Result};
use crate::value::{self, Value};

/// Represents the supported data types in the database schema.
/// These types define the structure of columns and the expected format of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// A boolean value (true or false).
    Bool,
    /// A 32-bit signed integer.
    Int,
    /// A 32-bit floating-point number.
    Float,
    /// A 64-bit floating-point number.
    Double,
    /// A UTF-8 character string. The declared length is kept for the schema
    /// but not enforced.
    Varchar(usize),
}

impl DataType {
    /// Two types are of the same kind when they store the same [Value] variant.
    /// `VARCHAR(10)` and `VARCHAR(255)` are of the same kind.
    pub fn same_kind(&self, other: &DataType) -> bool {
        matches!(
            (self, other),
            (Self::Bool, Self::Bool)
                | (Self::Int, Self::Int)
                | (Self::Float, Self::Float)
                | (Self::Double, Self::Double)
                | (Self::Varchar(_), Self::Varchar(_))
        )
    }

    /// Returns `true` if `value` can be stored in a column of this type.
    /// `NULL` fits every type; nullability is a column constraint.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::Bool, Value::Bool(_))
                | (Self::Int, Value::Int(_))
                | (Self::Float, Value::Float(_))
                | (Self::Double, Value::Double(_))
                | (Self::Varchar(_), Value::Text(_))
        )
    }

    /// Resolves the textual form of a literal (already stripped of its quotes)
    /// into a [Value] of this type.
    ///
    /// `NULL` in any case maps to [Value::Null] for every type.
    ///
    /// # Errors
    /// Returns [DbError::Syntax] when the text is not a valid literal for the type.
    ///
    /// # Example
    /// ```
    /// # use minidb::{DataType, Value};
    /// assert_eq!(DataType::Int.parse_literal("-100").unwrap(), Value::Int(-100));
    /// assert_eq!(DataType::Bool.parse_literal("TRUE").unwrap(), Value::Bool(true));
    /// assert!(DataType::Int.parse_literal("Nikita").is_err());
    /// ```
    pub fn parse_literal(&self, text: &str) -> Result<Value> {
        if value::is_null_literal(text) {
            return Ok(Value::Null);
        }
        match self {
            Self::Bool => value::parse_bool_literal(text)
                .map(Value::Bool)
                .ok_or_else(|| DbError::syntax(format!("Invalid BOOL value {text:?}"))),
            Self::Int => value::parse_int_literal(text)
                .map(Value::Int)
                .ok_or_else(|| DbError::syntax(format!("Invalid INT value {text:?}"))),
            Self::Float => value::parse_float_literal(text)
                .map(|f| f as f32)
                .filter(|f| f.is_finite())
                .map(Value::Float)
                .ok_or_else(|| DbError::syntax(format!("Invalid FLOAT value {text:?}"))),
            Self::Double => value::parse_float_literal(text)
                .map(Value::Double)
                .ok_or_else(|| DbError::syntax(format!("Invalid DOUBLE value {text:?}"))),
            Self::Varchar(_) => Ok(Value::Text(text.into())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "BOOL"),
            Self::Int => write!(f, "INT"),
            Self::Float => write!(f, "FLOAT"),
            Self::Double => write!(f, "DOUBLE"),
            Self::Varchar(len) => write!(f, "VARCHAR({len})"),
        }
    }
}

/// Parses the tag written by [DataType]'s `Display` implementation.
impl FromStr for DataType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.to_uppercase();
        match upper.as_str() {
            "BOOL" => Ok(Self::Bool),
            "INT" => Ok(Self::Int),
            "FLOAT" => Ok(Self::Float),
            "DOUBLE" => Ok(Self::Double),
            _ => upper
                .strip_prefix("VARCHAR(")
                .and_then(|rest| rest.strip_suffix(')'))
                .and_then(|len| len.parse::<usize>().ok())
                .map(Self::Varchar)
                .ok_or_else(|| DbError::syntax(format!("Invalid type {s:?}"))),
        }
    }
}

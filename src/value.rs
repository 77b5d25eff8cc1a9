use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Represents a single data value stored in the database.
///
/// This enum wraps all supported Rust types into a single type that can be
/// passed around the engine. It includes support for SQL `NULL` values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// represents an empty or missing value.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 32-bit signed integer value.
    Int(i32),
    /// A 32-bit floating-point value.
    Float(f32),
    /// A 64-bit floating-point value.
    Double(f64),
    /// A UTF-8 string value, wrapped in an [Arc] for cheap cloning
    /// when rows are copied into join results.
    Text(Arc<str>),
}

impl Value {
    /// Returns `true` if the value is [Value::Null].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the inner integer value if this is a [Value::Int].
    /// Otherwise, returns `None`.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the inner value widened to `f64` if this is a [Value::Float]
    /// or a [Value::Double]. Otherwise, returns `None`.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(f64::from(*f)),
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns a reference to the inner string slice if this is a [Value::Text].
    /// Otherwise, returns `None`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the inner boolean value if this is a [Value::Bool].
    /// Otherwise, returns `None`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Orders two values of the same variant.
    ///
    /// Returns `None` when either side is [Value::Null] or when the variants differ:
    /// a string is never ordered against a number. `FLOAT` and `DOUBLE` are both
    /// floating point and compare with each other.
    pub fn cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(l), Self::Bool(r)) => Some(l.cmp(r)),
            (Self::Int(l), Self::Int(r)) => Some(l.cmp(r)),
            (Self::Text(l), Self::Text(r)) => Some(l.cmp(r)),
            (Self::Float(_) | Self::Double(_), Self::Float(_) | Self::Double(_)) => {
                let (l, r) = (self.as_double()?, other.as_double()?);
                l.partial_cmp(&r)
            }
            _ => None,
        }
    }

    /// Interprets the value as a condition on its own: booleans as themselves,
    /// numbers are true when non-zero, strings and `NULL` are false.
    pub fn truthiness(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Double(d) => *d != 0.0,
            Self::Text(_) | Self::Null => false,
        }
    }

    /// Number of characters used by the `Display` form of the value.
    pub fn display_width(&self) -> usize {
        match self {
            Self::Text(s) => s.chars().count(),
            other => other.to_string().len(),
        }
    }

    /// Guesses the value of an untyped literal by trial matching, in order:
    /// integer, `NULL`, boolean, floating point, and finally plain text.
    pub fn coerce_literal(text: &str) -> Value {
        if let Some(i) = parse_int_literal(text) {
            Value::Int(i)
        } else if is_null_literal(text) {
            Value::Null
        } else if let Some(b) = parse_bool_literal(text) {
            Value::Bool(b)
        } else if let Some(d) = parse_float_literal(text) {
            Value::Double(d)
        } else {
            Value::Text(text.into())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.pad("NULL"),
            Self::Bool(true) => f.pad("TRUE"),
            Self::Bool(false) => f.pad("FALSE"),
            Self::Int(i) => f.pad(&i.to_string()),
            Self::Float(v) => f.pad(&v.to_string()),
            Self::Double(v) => f.pad(&v.to_string()),
            Self::Text(s) => f.pad(s),
        }
    }
}

/// `NULL`, case-insensitively.
pub fn is_null_literal(text: &str) -> bool {
    text.eq_ignore_ascii_case("null")
}

/// `1`, `0`, `true` or `false`, the two words case-insensitively.
pub fn parse_bool_literal(text: &str) -> Option<bool> {
    match text {
        "1" => Some(true),
        "0" => Some(false),
        _ if text.eq_ignore_ascii_case("true") => Some(true),
        _ if text.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn split_sign(text: &str) -> &str {
    text.strip_prefix(['+', '-']).unwrap_or(text)
}

fn all_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// An optional sign followed by digits, within the `i32` range.
pub fn parse_int_literal(text: &str) -> Option<i32> {
    if !all_digits(split_sign(text)) {
        return None;
    }
    text.parse().ok()
}

/// An optional sign, digits, and an optional fractional part (`-3`, `2.75`).
/// Literals too large for an `f64` are rejected.
pub fn parse_float_literal(text: &str) -> Option<f64> {
    let unsigned = split_sign(text);
    let well_formed = match unsigned.split_once('.') {
        Some((whole, fraction)) => all_digits(whole) && all_digits(fraction),
        None => all_digits(unsigned),
    };
    if !well_formed {
        return None;
    }
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

//! Evaluation of postfix conditions against table rows.
//!
//! A [Condition] is first bound to a [Schema]: every operand is resolved once
//! to either a column position or a typed literal. The resulting
//! [BoundCondition] is then run on each row by a small stack machine.

use std::cmp::Ordering;

use crate::condition::{CmpOp, CondToken, Condition, LogicOp, Operand, Predicate};
use crate::error::{DbError, Result};
use crate::table::{Row, Schema};
use crate::value::{self, Value};

#[derive(Debug, Clone, PartialEq)]
enum Side {
    Column(usize),
    Literal(Value),
}

impl Side {
    fn value<'a>(&'a self, row: &'a Row) -> &'a Value {
        match self {
            Self::Column(idx) => &row[*idx],
            Self::Literal(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Check {
    Compare { lhs: Side, op: CmpOp, rhs: Side },
    /// A lone column, true when its value is truthy.
    Truthy(usize),
    Constant(bool),
}

impl Check {
    fn test(&self, row: &Row) -> bool {
        match self {
            Self::Compare { lhs, op, rhs } => compare(lhs.value(row), *op, rhs.value(row)),
            Self::Truthy(idx) => row[*idx].truthiness(),
            Self::Constant(b) => *b,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Check(Check),
    Op(LogicOp),
}

/// A condition whose operands are resolved against a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundCondition {
    steps: Vec<Step>,
}

impl Condition {
    /// Resolves every operand of the condition against `schema`.
    ///
    /// # Errors
    /// - [DbError::Logic] if a qualified name (`T.c`) designates no column.
    /// - [DbError::Syntax] if a stand-alone operand cannot be read as a boolean.
    pub fn bind(&self, schema: &Schema) -> Result<BoundCondition> {
        let steps = self
            .postfix()
            .iter()
            .map(|token| match token {
                CondToken::Leaf(predicate) => bind_predicate(predicate, schema).map(Step::Check),
                CondToken::Op(op) => Ok(Step::Op(*op)),
            })
            .collect::<Result<_>>()?;
        Ok(BoundCondition { steps })
    }
}

impl BoundCondition {
    /// Runs the condition on one row.
    ///
    /// # Errors
    /// Returns [DbError::Syntax] if the postfix sequence does not reduce to a
    /// single boolean.
    pub fn evaluate(&self, row: &Row) -> Result<bool> {
        let mut stack: Vec<bool> = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            match step {
                Step::Check(check) => stack.push(check.test(row)),
                Step::Op(LogicOp::Not) => {
                    let operand = stack.pop().ok_or_else(missing_operand)?;
                    stack.push(!operand);
                }
                Step::Op(op) => {
                    let (rhs, lhs) = (
                        stack.pop().ok_or_else(missing_operand)?,
                        stack.pop().ok_or_else(missing_operand)?,
                    );
                    stack.push(match op {
                        LogicOp::And => lhs && rhs,
                        _ => lhs || rhs,
                    });
                }
            }
        }

        match stack.as_slice() {
            [result] => Ok(*result),
            _ => Err(DbError::syntax("Invalid logic expression")),
        }
    }
}

fn missing_operand() -> DbError {
    DbError::syntax("Invalid logic expression: missing operand")
}

fn bind_predicate(predicate: &Predicate, schema: &Schema) -> Result<Check> {
    match predicate {
        Predicate::Compare { lhs, op, rhs } => {
            let (l, r) = (lookup(lhs, schema)?, lookup(rhs, schema)?);
            let lhs = bind_side(lhs, l, r, schema);
            let rhs = bind_side(rhs, r, l, schema);
            Ok(Check::Compare { lhs, op: *op, rhs })
        }
        Predicate::Unary(operand) => bind_unary(operand, schema),
    }
}

/// Finds the column named by an operand, if any.
fn lookup(operand: &Operand, schema: &Schema) -> Result<Option<usize>> {
    let idx = schema.index_of(&operand.text);
    if idx.is_none() && !operand.quoted && is_qualified_name(&operand.text) {
        return Err(DbError::logic(format!(
            "Nonexistent column {:?}",
            operand.text
        )));
    }
    Ok(idx)
}

fn is_qualified_name(text: &str) -> bool {
    value::parse_float_literal(text).is_none() && text.contains('.')
}

/// A literal facing a column takes that column's type when it can.
fn bind_side(operand: &Operand, own: Option<usize>, other: Option<usize>, schema: &Schema) -> Side {
    if let Some(idx) = own {
        return Side::Column(idx);
    }
    let typed = other.and_then(|idx| {
        schema
            .column(idx)
            .data_type
            .parse_literal(&operand.text)
            .ok()
    });
    Side::Literal(typed.unwrap_or_else(|| Value::coerce_literal(&operand.text)))
}

fn bind_unary(operand: &Operand, schema: &Schema) -> Result<Check> {
    if operand.quoted {
        return Ok(Check::Constant(false));
    }
    if let Some(idx) = lookup(operand, schema)? {
        return Ok(Check::Truthy(idx));
    }

    let text = operand.text.as_str();
    if let Some(b) = value::parse_bool_literal(text) {
        Ok(Check::Constant(b))
    } else if let Some(i) = value::parse_int_literal(text) {
        Ok(Check::Constant(i != 0))
    } else if let Some(d) = value::parse_float_literal(text) {
        Ok(Check::Constant(d != 0.0))
    } else if value::is_null_literal(text) {
        Ok(Check::Constant(false))
    } else {
        Err(DbError::syntax(format!("Invalid logic expression: {text}")))
    }
}

/// Equality used by `=`, `IS` and join keys: `NULL` equals only `NULL`, and
/// values of different types are never equal.
pub(crate) fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs.is_null(), rhs.is_null()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        (false, false) => lhs.cmp_same_type(rhs) == Some(Ordering::Equal),
    }
}

/// Applies a comparator.
///
/// - `=`/`IS` follow [values_equal].
/// - `<>`/`IS NOT` are true when exactly one side is `NULL` or when two
///   values of the same type differ.
/// - Ordering comparators are false when a side is `NULL` or the types differ.
pub fn compare(lhs: &Value, op: CmpOp, rhs: &Value) -> bool {
    match op {
        CmpOp::Eq | CmpOp::Is => values_equal(lhs, rhs),
        CmpOp::NotEq | CmpOp::IsNot => match (lhs.is_null(), rhs.is_null()) {
            (true, true) => false,
            (true, false) | (false, true) => true,
            (false, false) => matches!(lhs.cmp_same_type(rhs), Some(o) if o != Ordering::Equal),
        },
        CmpOp::Gt => lhs.cmp_same_type(rhs) == Some(Ordering::Greater),
        CmpOp::GtEq => matches!(
            lhs.cmp_same_type(rhs),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CmpOp::Lt => lhs.cmp_same_type(rhs) == Some(Ordering::Less),
        CmpOp::LtEq => matches!(
            lhs.cmp_same_type(rhs),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnInfo;
    use crate::condition::{OperatorTable, compile};
    use crate::data_type::DataType;

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnInfo::new("ISU".into(), "Students".into(), DataType::Int, false),
            ColumnInfo::new("age".into(), "Students".into(), DataType::Int, false),
            ColumnInfo::new("name".into(), "Students".into(), DataType::Varchar(255), false),
            ColumnInfo::new("grant".into(), "Students".into(), DataType::Double, false),
            ColumnInfo::new("active".into(), "Students".into(), DataType::Bool, false),
        ])
    }

    fn row(isu: i32, age: Option<i32>, name: &str, grant: f64, active: bool) -> Row {
        vec![
            Value::Int(isu),
            age.map_or(Value::Null, Value::Int),
            Value::Text(name.into()),
            Value::Double(grant),
            Value::Bool(active),
        ]
    }

    fn eval(text: &str, row: &Row) -> bool {
        compile(text, &OperatorTable::default())
            .unwrap()
            .bind(&schema())
            .unwrap()
            .evaluate(row)
            .unwrap()
    }

    #[test]
    fn test_comparisons() {
        let nikita = row(368050, Some(27), "Nikita", 2.5, true);

        assert!(eval("age < 30", &nikita));
        assert!(!eval("age < 27", &nikita));
        assert!(eval("age <= 27", &nikita));
        assert!(eval("age >= 27", &nikita));
        assert!(eval("age > -100", &nikita));
        assert!(eval("30 > age", &nikita));
        assert!(eval("name = Nikita", &nikita));
        assert!(eval("name = 'Nikita'", &nikita));
        assert!(eval("name != 'Alex'", &nikita));
        assert!(eval("grant = 2.5", &nikita));
        assert!(eval("grant > 2", &nikita));
        assert!(eval("active = TRUE", &nikita));
        assert!(eval("Students.ISU = 368050", &nikita));
    }

    #[test]
    fn test_logic_operators() {
        let alex = row(111111, Some(18), "Alex", 0.0, false);

        assert!(eval("age < 20 AND name = Alex", &alex));
        assert!(!eval("age < 20 AND name = Nikita", &alex));
        assert!(eval("age > 20 OR name = Alex", &alex));
        assert!(eval("NOT age > 20", &alex));
        assert!(!eval("NOT (age < 20 OR name = Nikita)", &alex));
        assert!(eval("name = Nikita AND age > 0 OR ISU = 111111", &alex));
        assert!(!eval("name = Nikita AND (age > 0 OR ISU = 111111)", &alex));
    }

    #[test]
    fn test_null_semantics() {
        let unknown = row(1, None, "X", 0.0, false);

        assert!(eval("age IS NULL", &unknown));
        assert!(eval("age = NULL", &unknown));
        assert!(!eval("age IS NOT NULL", &unknown));
        assert!(eval("age <> 5", &unknown));
        assert!(!eval("age = 5", &unknown));
        assert!(!eval("age < 5", &unknown));
        assert!(!eval("age >= 5", &unknown));
        assert!(!eval("ISU IS NULL", &unknown));
    }

    #[test]
    fn test_type_mismatch_is_false() {
        let nikita = row(368050, Some(27), "Nikita", 2.5, true);

        assert!(!eval("age = Nikita", &nikita));
        assert!(!eval("age <> Nikita", &nikita));
        assert!(!eval("grant < 'abc'", &nikita));
    }

    #[test]
    fn test_column_to_column() {
        let same = row(5, Some(5), "X", 0.0, false);
        let diff = row(5, Some(6), "X", 0.0, false);

        assert!(eval("ISU = age", &same));
        assert!(!eval("ISU = age", &diff));
        assert!(eval("age > ISU", &diff));
    }

    #[test]
    fn test_unary_leaves() {
        let active = row(1, Some(1), "X", 0.0, true);
        let inactive = row(1, Some(1), "X", 0.0, false);

        assert!(eval("true", &active));
        assert!(!eval("FALSE", &active));
        assert!(eval("1", &active));
        assert!(!eval("0", &active));
        assert!(eval("2.5", &active));
        assert!(!eval("'text'", &active));
        assert!(eval("active", &active));
        assert!(!eval("active", &inactive));
        assert!(eval("NOT active AND age = 1", &inactive));
    }

    #[test]
    fn test_always() {
        let bound = Condition::always().bind(&schema()).unwrap();
        assert!(bound.evaluate(&row(0, None, "", 0.0, false)).unwrap());
    }

    #[test]
    fn test_bind_errors() {
        let operators = OperatorTable::default();

        let condition = compile("mark.ISU = 5", &operators).unwrap();
        assert!(matches!(condition.bind(&schema()), Err(DbError::Logic(_))));

        let condition = compile("surname", &operators).unwrap();
        assert!(matches!(condition.bind(&schema()), Err(DbError::Syntax(_))));
    }

    #[test]
    fn test_compare_directly() {
        assert!(compare(&Value::Null, CmpOp::Is, &Value::Null));
        assert!(!compare(&Value::Null, CmpOp::IsNot, &Value::Null));
        assert!(compare(&Value::Int(2), CmpOp::GtEq, &Value::Int(2)));
        assert!(!compare(&Value::Int(2), CmpOp::Eq, &Value::Double(2.0)));
        assert!(compare(&Value::Float(1.5), CmpOp::Lt, &Value::Double(2.0)));
        assert!(values_equal(&Value::Text("a".into()), &Value::Text("a".into())));
    }
}

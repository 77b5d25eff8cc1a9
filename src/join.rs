//! Nested-loop joins of two tables on one pair of columns.
//!
//! Every join produces a fresh [Table] whose schema is the left columns
//! followed by the right columns. Join results carry no primary key and are
//! never stored in a database.

use bitvec::prelude::*;
use tracing::debug;

use crate::eval::values_equal;
use crate::error::Result;
use crate::table::{Row, Schema, Table};
use crate::value::Value;

/// Pairs every row of `left` with every row of `right` whose `right_col`
/// value equals the `left_col` value.
///
/// # Errors
/// Returns [crate::DbError::Logic] if either column does not exist.
pub fn inner_join(left: &Table, right: &Table, left_col: &str, right_col: &str) -> Result<Table> {
    join(left, right, left_col, right_col, false)
}

/// Like [inner_join], but a left row without any match is kept once, with
/// the right part set to `NULL`.
pub fn left_join(left: &Table, right: &Table, left_col: &str, right_col: &str) -> Result<Table> {
    join(left, right, left_col, right_col, true)
}

/// The mirror of [left_join]: every row of `right` is kept. The result lists
/// the columns of `right` first.
pub fn right_join(left: &Table, right: &Table, left_col: &str, right_col: &str) -> Result<Table> {
    left_join(right, left, right_col, left_col)
}

fn join(
    left: &Table,
    right: &Table,
    left_col: &str,
    right_col: &str,
    keep_unmatched: bool,
) -> Result<Table> {
    let lc = left.schema().resolve(left_col)?;
    let rc = right.schema().resolve(right_col)?;

    let schema = Schema::merge(left.schema(), right.schema());
    let mut result = Table::new(format!("{}_{}", left.name, right.name), schema, None);

    let mut matched = bitvec![0; left.row_count()];
    for (i, lrow) in left.rows().iter().enumerate() {
        for rrow in right.rows() {
            if values_equal(&lrow[lc], &rrow[rc]) {
                matched.set(i, true);
                result.push_row(concat(lrow, rrow));
            }
        }
        if keep_unmatched && !matched[i] {
            let nulls = vec![Value::Null; right.schema().len()];
            result.push_row(concat(lrow, &nulls));
        }
    }

    debug!(
        left = %left.name,
        right = %right.name,
        rows = result.row_count(),
        unmatched = matched.count_zeros(),
        "join computed"
    );
    Ok(result)
}

fn concat(lhs: &Row, rhs: &[Value]) -> Row {
    lhs.iter().chain(rhs).cloned().collect()
}

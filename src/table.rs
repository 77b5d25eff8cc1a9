use std::collections::HashMap;

use bitvec::prelude::*;
use tracing::debug;

use crate::column::ColumnInfo;
use crate::condition::Condition;
use crate::data_type::DataType;
use crate::database::QueryResult;
use crate::error::{DbError, Result};
use crate::value::Value;

/// One record of a table, one [Value] per column in schema order.
pub type Row = Vec<Value>;

/// Column definition in a `CREATE TABLE` statement
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub not_null: bool,
    pub primary_key: bool,
}

/// Ordered column metadata of a table with a name lookup.
///
/// The position of a column in `columns` is its position in every [Row].
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<ColumnInfo>,
    lookup: HashMap<String, usize>,
}

impl Schema {
    /// Builds a schema from columns in row order. When two columns share a
    /// name, the bare name designates the first one.
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        let mut lookup = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            lookup.entry(column.name.clone()).or_insert(i);
        }
        Self { columns, lookup }
    }

    /// Concatenates two schemas: `left`'s columns followed by `right`'s.
    pub fn merge(left: &Schema, right: &Schema) -> Self {
        Self::new(left.columns.iter().chain(&right.columns).cloned().collect())
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> &ColumnInfo {
        &self.columns[idx]
    }

    pub(crate) fn column_mut(&mut self, idx: usize) -> &mut ColumnInfo {
        &mut self.columns[idx]
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Finds the position of a column given by a bare (`age`) or qualified
    /// (`Students.age`) name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        if name.contains('.') {
            return self.columns.iter().position(|c| c.is_named(name));
        }
        self.lookup.get(name).copied()
    }

    /// Like [Schema::index_of], failing with [DbError::Logic] on unknown names.
    pub fn resolve(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| DbError::logic(format!("Nonexistent column {name:?}")))
    }
}

#[derive(Debug)]
pub struct Table {
    pub name: String,
    schema: Schema,
    /// Position of the primary-key column. Join results have none.
    primary_key: Option<usize>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(name: String, schema: Schema, primary_key: Option<usize>) -> Self {
        Self {
            name,
            schema,
            primary_key,
            rows: Vec::new(),
        }
    }

    /// Creates an empty table from `CREATE TABLE` column definitions.
    ///
    /// Without any `PRIMARY KEY` clause the first column becomes the primary key.
    ///
    /// # Errors
    /// Returns [DbError::Logic] on duplicate column names or several primary keys,
    /// and [DbError::Syntax] if no column is given.
    pub fn from_defs(name: String, defs: Vec<ColumnDef>) -> Result<Self> {
        if defs.is_empty() {
            return Err(DbError::syntax(format!("Table {name} has no column")));
        }

        let mut primary_key = None;
        let mut columns: Vec<ColumnInfo> = Vec::with_capacity(defs.len());
        for (i, def) in defs.into_iter().enumerate() {
            if columns.iter().any(|c| c.name == def.name) {
                return Err(DbError::logic(format!("Key {} already exists", def.name)));
            }
            if def.primary_key {
                if primary_key.is_some() {
                    return Err(DbError::logic("Multiple primary keys"));
                }
                primary_key = Some(i);
            }
            columns.push(ColumnInfo::new(
                def.name,
                name.clone(),
                def.data_type,
                def.not_null,
            ));
        }

        Ok(Self::new(name, Schema::new(columns), primary_key.or(Some(0))))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn get_row(&self, row_idx: usize) -> Option<&Row> {
        self.rows.get(row_idx)
    }

    /// Name of the primary-key column, if the table enforces one.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key
            .map(|idx| self.schema.column(idx).name.as_str())
    }

    pub fn is_column(&self, name: &str) -> bool {
        self.schema.index_of(name).is_some()
    }

    /// Inserts a row given as literal texts (quotes already removed).
    ///
    /// `keys` names the columns receiving the values; `None` means every column
    /// in schema order. Columns left out are `NULL`.
    ///
    /// # Errors
    /// - [DbError::Logic] if the counts differ, a column is unknown or named
    ///   twice, or a constraint is violated.
    /// - [DbError::Syntax] if a literal does not fit its column type.
    pub fn add_row(&mut self, values: &[String], keys: Option<&[String]>) -> Result<()> {
        let positions: Vec<usize> = match keys {
            None => (0..self.schema.len()).collect(),
            Some(names) => names
                .iter()
                .map(|name| self.schema.resolve(name))
                .collect::<Result<_>>()?,
        };

        if values.len() != positions.len() {
            return Err(DbError::logic(format!(
                "Counts of values and columns aren't equal: {} vs {}",
                values.len(),
                positions.len()
            )));
        }

        let mut row = vec![Value::Null; self.schema.len()];
        let mut assigned = bitvec![0; self.schema.len()];
        for (&pos, text) in positions.iter().zip(values) {
            if assigned.replace(pos, true) {
                return Err(DbError::logic(format!(
                    "Column {} is given more than once",
                    self.schema.column(pos).name
                )));
            }
            row[pos] = self.schema.column(pos).data_type.parse_literal(text)?;
        }

        self.insert(row)
    }

    /// Inserts an already typed row.
    ///
    /// The row is validated completely before anything is stored, so a failed
    /// insertion leaves the table untouched.
    ///
    /// # Errors
    /// Returns [DbError::Logic] if the row length or a value type does not match
    /// the schema, a `NOT NULL` column is `NULL`, or the primary key is repeated.
    pub fn insert(&mut self, values: Row) -> Result<()> {
        // different sizes
        if values.len() != self.schema.len() {
            return Err(DbError::logic(format!(
                "size of the row mismatched with the size of a table row, {} vs {}",
                values.len(),
                self.schema.len()
            )));
        }

        for (column, value) in self.schema.columns().iter().zip(&values) {
            if !column.data_type.accepts(value) {
                return Err(DbError::logic(format!(
                    "type of value {value:?} mismatch with column {} of type {}",
                    column.name, column.data_type
                )));
            }
            if column.not_null && value.is_null() {
                return Err(DbError::logic(format!(
                    "NOT NULL column {} can't be NULL",
                    column.name
                )));
            }
        }

        if let Some(pk) = self.primary_key {
            let key = &values[pk];
            if !key.is_null() && self.rows.iter().any(|row| &row[pk] == key) {
                return Err(DbError::logic(format!("Primary key repetition: {key}")));
            }
        }

        for (idx, value) in values.iter().enumerate() {
            self.schema.column_mut(idx).fit(value);
        }
        self.rows.push(values);
        Ok(())
    }

    /// Appends a row without any check. Used to fill join results.
    pub(crate) fn push_row(&mut self, row: Row) {
        debug_assert_eq!(row.len(), self.schema.len());
        self.rows.push(row);
    }

    /// Removes every row accepted by `condition` and returns how many were removed.
    ///
    /// Rows are removed by position, so two distinct rows with equal contents
    /// are only removed if both are accepted.
    pub fn delete_rows(&mut self, condition: &Condition) -> Result<usize> {
        let doomed = self.matching_rows(condition)?;
        let removed = doomed.count_ones();

        let mut idx = 0;
        self.rows.retain(|_| {
            let keep = !doomed[idx];
            idx += 1;
            keep
        });

        debug!(table = %self.name, removed, "rows deleted");
        Ok(removed)
    }

    /// Assigns values to every row accepted by `condition` and returns how many
    /// rows were updated.
    ///
    /// Each literal is resolved once against its column type before any row is
    /// touched; the update is rejected as a whole if it would break a
    /// `NOT NULL` or primary-key constraint.
    pub fn update_values(
        &mut self,
        assignments: &[(String, String)],
        condition: &Condition,
    ) -> Result<usize> {
        let mut targets: Vec<(usize, Value)> = Vec::with_capacity(assignments.len());
        for (name, text) in assignments {
            let pos = self.schema.resolve(name)?;
            if targets.iter().any(|(p, _)| *p == pos) {
                return Err(DbError::logic(format!("Multiple keys in UPDATE: {name}")));
            }
            let column = self.schema.column(pos);
            let value = column.data_type.parse_literal(text)?;
            if column.not_null && value.is_null() {
                return Err(DbError::logic(format!(
                    "NOT NULL column {} can't be NULL",
                    column.name
                )));
            }
            targets.push((pos, value));
        }

        let matched = self.matching_rows(condition)?;
        let count = matched.count_ones();

        if let Some(pk) = self.primary_key {
            let new_key = targets
                .iter()
                .find(|(pos, value)| *pos == pk && !value.is_null());
            if let Some((_, key)) = new_key {
                let clash = count > 1
                    || (count == 1
                        && self
                            .rows
                            .iter()
                            .enumerate()
                            .any(|(i, row)| !matched[i] && &row[pk] == key));
                if clash {
                    return Err(DbError::logic(format!("Primary key repetition: {key}")));
                }
            }
        }

        for i in matched.iter_ones() {
            for (pos, value) in &targets {
                self.rows[i][*pos] = value.clone();
            }
        }
        if count > 0 {
            for (pos, value) in &targets {
                self.schema.column_mut(*pos).fit(value);
            }
        }

        debug!(table = %self.name, updated = count, "rows updated");
        Ok(count)
    }

    /// Filters rows with `condition` and projects them on `columns`
    /// (every column in schema order when `None`).
    ///
    /// # Errors
    /// Returns [DbError::Logic] if a projected column does not exist, and any
    /// error raised while binding or evaluating the condition.
    pub fn select(&self, columns: Option<&[String]>, condition: &Condition) -> Result<QueryResult> {
        let positions: Vec<usize> = match columns {
            None => (0..self.schema.len()).collect(),
            Some(names) => names
                .iter()
                .map(|name| self.schema.resolve(name))
                .collect::<Result<_>>()?,
        };

        let bound = condition.bind(&self.schema)?;
        let mut rows = Vec::new();
        for row in &self.rows {
            if bound.evaluate(row)? {
                rows.push(positions.iter().map(|&pos| row[pos].clone()).collect());
            }
        }

        Ok(QueryResult {
            columns: positions
                .iter()
                .map(|&pos| self.schema.column(pos).name.clone())
                .collect(),
            widths: positions
                .iter()
                .map(|&pos| self.schema.column(pos).width)
                .collect(),
            rows,
        })
    }

    /// Evaluates `condition` on every row, returning a bit per row.
    fn matching_rows(&self, condition: &Condition) -> Result<BitVec> {
        let bound = condition.bind(&self.schema)?;
        let mut matched = bitvec![0; self.rows.len()];
        for (i, row) in self.rows.iter().enumerate() {
            if bound.evaluate(row)? {
                matched.set(i, true);
            }
        }
        Ok(matched)
    }
}

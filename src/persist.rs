//! Plain-text persistence of a whole database.
//!
//! ```text
//! DataBase
//! 1
//! Students
//! 2
//! ISU 0 6 INT 0 -
//! name 1 6 VARCHAR(255) 1 -
//! ISU
//! 1
//! '368050' 'Nikita'
//! ```
//!
//! Column lines are `name position width TYPE not_null foreign_key`, where the
//! foreign key is `table.position` or `-`. The primary key line is `-` when the
//! table has none. Row fields are quoted and separated by one space; `NULL` is
//! written as `'NULL'`.

use std::fs;
use std::path::Path;
use std::str::Lines;

use crate::column::{ColumnInfo, ForeignKey};
use crate::data_type::DataType;
use crate::error::{DbError, Result};
use crate::table::{Schema, Table};
use crate::value::Value;

const NONE: &str = "-";

/// Writes a database to `path`, tables in the given order.
///
/// # Errors
/// - [DbError::Logic] if a text value cannot be stored in a row line. Nothing
///   is written in that case.
/// - [DbError::WriteFile] if the file cannot be written.
pub fn save<'t>(path: &Path, name: &str, tables: impl ExactSizeIterator<Item = &'t Table>) -> Result<()> {
    if name.contains(['\n', '\r']) {
        return Err(DbError::logic(format!("Cannot save database name {name:?}")));
    }
    let mut lines = vec![name.to_string(), tables.len().to_string()];
    for table in tables {
        write_table(&mut lines, table)?;
    }

    let mut out = lines.join("\n");
    out.push('\n');
    fs::write(path, out).map_err(|source| DbError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

fn write_table(lines: &mut Vec<String>, table: &Table) -> Result<()> {
    lines.push(table.name.clone());
    lines.push(table.schema().len().to_string());
    for (pos, column) in table.schema().columns().iter().enumerate() {
        let foreign_key = column
            .foreign_key
            .as_ref()
            .map_or_else(|| NONE.to_string(), |fk| format!("{}.{}", fk.table, fk.column));
        lines.push(format!(
            "{} {} {} {} {} {}",
            column.name,
            pos,
            column.width,
            column.data_type,
            u8::from(column.not_null),
            foreign_key
        ));
    }
    lines.push(table.primary_key().unwrap_or(NONE).to_string());
    lines.push(table.row_count().to_string());
    for (index, row) in table.rows().iter().enumerate() {
        let mut fields = Vec::with_capacity(row.len());
        for value in row {
            if let Value::Text(text) = value {
                if !fits_row_line(text) {
                    return Err(DbError::logic(format!(
                        "Cannot save table {}: row {} holds the text {text:?}",
                        table.name,
                        index + 1
                    )));
                }
            }
            fields.push(format!("'{value}'"));
        }
        lines.push(fields.join(" "));
    }
    Ok(())
}

/// Whether `text` reads back unchanged from a quoted row field.
fn fits_row_line(text: &str) -> bool {
    !text.contains(['\n', '\r']) && !text.contains("' '") && !text.ends_with("' ")
}

/// Reads a database written by [save], returning its name and its tables.
///
/// # Errors
/// - [DbError::WriteFile] if the file cannot be read.
/// - [DbError::CorruptFile] if its content does not follow the layout, or if
///   a stored row breaks a constraint of its table.
pub fn load(path: &Path) -> Result<(String, Vec<Table>)> {
    let text = fs::read_to_string(path).map_err(|source| DbError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = Reader::new(&text);
    let name = reader.next_line("database name")?.to_string();
    let count: usize = reader.parse_line("table count")?;

    let mut tables = Vec::with_capacity(count);
    for _ in 0..count {
        let table = read_table(&mut reader)?;
        if tables.iter().any(|t: &Table| t.name == table.name) {
            return Err(reader.corrupt(format!("table {} is stored twice", table.name)));
        }
        tables.push(table);
    }

    while let Some(line) = reader.lines.next() {
        reader.line += 1;
        if !line.trim().is_empty() {
            return Err(reader.corrupt(format!("unexpected trailing content {line:?}")));
        }
    }
    Ok((name, tables))
}

fn read_table(reader: &mut Reader) -> Result<Table> {
    let name = reader.next_line("table name")?.to_string();
    let column_count: usize = reader.parse_line("column count")?;

    let mut columns = Vec::with_capacity(column_count);
    for pos in 0..column_count {
        columns.push(read_column(reader, &name, pos)?);
    }
    let schema = Schema::new(columns);

    let primary_key = match reader.next_line("primary key")? {
        NONE => None,
        key => Some(
            schema
                .index_of(key)
                .ok_or_else(|| reader.corrupt(format!("unknown primary key {key:?}")))?,
        ),
    };

    let mut table = Table::new(name, schema, primary_key);
    let row_count: usize = reader.parse_line("row count")?;
    for _ in 0..row_count {
        let line = reader.next_line("row")?;
        let fields = split_row(line)
            .filter(|fields| fields.len() == column_count)
            .ok_or_else(|| reader.corrupt(format!("malformed row {line:?}")))?;

        let mut row = Vec::with_capacity(column_count);
        for (pos, field) in fields.into_iter().enumerate() {
            let value = table
                .schema()
                .column(pos)
                .data_type
                .parse_literal(field)
                .map_err(|e| reader.corrupt(e.to_string()))?;
            row.push(value);
        }
        table.insert(row).map_err(|e| reader.corrupt(e.to_string()))?;
    }

    Ok(table)
}

fn read_column(reader: &mut Reader, table: &str, pos: usize) -> Result<ColumnInfo> {
    let line = reader.next_line("column")?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [name, position, width, data_type, not_null, foreign_key] = fields[..] else {
        return Err(reader.corrupt(format!("malformed column {line:?}")));
    };

    if position.parse::<usize>().ok() != Some(pos) {
        return Err(reader.corrupt(format!("column {name} is not at position {pos}")));
    }
    let data_type = data_type
        .parse::<DataType>()
        .map_err(|e| reader.corrupt(e.to_string()))?;
    let not_null = match not_null {
        "0" => false,
        "1" => true,
        other => return Err(reader.corrupt(format!("invalid not-null flag {other:?}"))),
    };

    let mut column = ColumnInfo::new(name.to_string(), table.to_string(), data_type, not_null);
    column.width = width
        .parse::<usize>()
        .map_err(|_| reader.corrupt(format!("invalid width {width:?}")))?
        .max(column.width);
    column.foreign_key = match foreign_key {
        NONE => None,
        fk => {
            let (ref_table, ref_column) = fk
                .rsplit_once('.')
                .and_then(|(t, c)| Some((t, c.parse::<usize>().ok()?)))
                .ok_or_else(|| reader.corrupt(format!("invalid foreign key {fk:?}")))?;
            Some(ForeignKey {
                table: ref_table.to_string(),
                column: ref_column,
            })
        }
    };
    Ok(column)
}

/// `'a' 'b c' ''` -> `["a", "b c", ""]`
fn split_row(line: &str) -> Option<Vec<&str>> {
    let inner = line.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.split("' '").collect())
}

struct Reader<'a> {
    lines: Lines<'a>,
    line: usize,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line: 0,
        }
    }

    fn next_line(&mut self, what: &str) -> Result<&'a str> {
        self.line += 1;
        self.lines
            .next()
            .ok_or_else(|| self.corrupt(format!("missing {what}")))
    }

    fn parse_line(&mut self, what: &str) -> Result<usize> {
        let line = self.next_line(what)?;
        line.trim()
            .parse()
            .map_err(|_| self.corrupt(format!("invalid {what} {line:?}")))
    }

    fn corrupt(&self, reason: impl Into<String>) -> DbError {
        DbError::CorruptFile {
            line: self.line,
            reason: reason.into(),
        }
    }
}

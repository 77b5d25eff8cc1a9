use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::{
    Value,
    ast::{ColumnsSelect, CreateTable, Delete, InsertInto, JoinKind, Select, Statement, Update},
    column::ForeignKey,
    config::DatabaseConfig,
    error::{DbError, Result},
    join, parser, persist,
    table::Table,
};

/// The main entry point for the in-memory database engine.
/// It manages a collection of tables and orchestrates query execution.
pub struct Database {
    config: DatabaseConfig,
    /// Name of the database, replaced when a file is loaded.
    name: String,
    /// A map of table names to their respective [Table] structures.
    tables: HashMap<String, Table>,
}

/// Represents the result of a successful `SELECT` query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// The names of the columns included in the result set.
    pub columns: Vec<String>,
    /// Display width of each column.
    pub widths: Vec<usize>,
    /// The actual data, returned as a vector of rows, where each row is a vector of [Value].
    pub rows: Vec<Vec<Value>>,
}

/// Prints the header then one line per row, every cell left-aligned and
/// padded to its column width.
impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = |cells: Vec<String>| cells.join(" ").trim_end().to_string();

        let header = self
            .columns
            .iter()
            .zip(&self.widths)
            .map(|(name, &w)| format!("{name:<w$}"))
            .collect();
        write!(f, "{}", line(header))?;

        for row in &self.rows {
            let cells = row
                .iter()
                .zip(&self.widths)
                .map(|(value, &w)| format!("{value:<w$}"))
                .collect();
            write!(f, "\n{}", line(cells))?;
        }
        Ok(())
    }
}

/// What a successfully executed statement did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Created(String),
    Dropped {
        table: String,
        /// Tables left in the database, sorted by name.
        remaining: Vec<String>,
    },
    Inserted(usize),
    Deleted(usize),
    Updated(usize),
    Rows(QueryResult),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(table) => write!(f, "Created table {table}."),
            Self::Dropped { table, remaining } if remaining.is_empty() => {
                write!(f, "Dropped table {table}. There are no remaining tables.")
            }
            Self::Dropped { table, remaining } => write!(
                f,
                "Dropped table {table}. Remaining tables:\n{}",
                remaining.join(" ")
            ),
            Self::Inserted(n) => write!(f, "Inserted {n} row(s)."),
            Self::Deleted(n) => write!(f, "Deleted {n} row(s)."),
            Self::Updated(n) => write!(f, "Updated {n} row(s)."),
            Self::Rows(result) => write!(f, "{result}"),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    /// Creates a new, empty database instance.
    pub fn new() -> Self {
        Self::with_config(DatabaseConfig::default())
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        Self {
            name: config.name.clone(),
            config,
            tables: HashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Retrieves a reference to a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Retrieves a mutable reference to a table by name.
    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    /// Returns the names of all tables currently stored, sorted.
    pub fn list_tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn table(&self, name: &str) -> Result<&Table> {
        self.get_table(name)
            .ok_or_else(|| DbError::logic(format!("Table {name} does not exist")))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.get_table_mut(name)
            .ok_or_else(|| DbError::logic(format!("Table {name} does not exist")))
    }

    /// Executes one `;`-terminated statement.
    ///
    /// A failing statement leaves the database as it was.
    ///
    /// # Errors
    /// Returns [DbError::Syntax] if the statement cannot be parsed and
    /// [DbError::Logic] if it cannot be applied.
    ///
    /// # Example
    /// ```
    /// use minidb::{Database, Outcome, Value};
    /// let mut db = Database::new();
    /// db.parse("CREATE TABLE users (id INT, name VARCHAR(20));").unwrap();
    /// db.parse("INSERT INTO users VALUES (1, 'Alice');").unwrap();
    ///
    /// let Outcome::Rows(result) = db.parse("SELECT name FROM users WHERE id = 1;").unwrap() else {
    ///     panic!("expected rows");
    /// };
    /// assert_eq!(result.rows[0][0], Value::Text("Alice".into()));
    /// ```
    pub fn parse(&mut self, sql: &str) -> Result<Outcome> {
        let statement = parser::parse_statement(sql, &self.config.operators)?;
        self.execute(statement)
    }

    /// Runs a read-only `SELECT` statement.
    ///
    /// # Errors
    /// Returns [DbError::Logic] if the statement is not a `SELECT`, and any
    /// error [Database::parse] would return for it.
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        match parser::parse_statement(sql, &self.config.operators)? {
            Statement::Select(select) => self.select(&select),
            statement => Err(DbError::logic(format!(
                "Statement {statement:?} is not a queryable statement"
            ))),
        }
    }

    /// Executes every statement of a script in order, reporting each result.
    /// A failing statement does not stop the following ones.
    pub fn run_script(&mut self, script: &str) -> Vec<Result<Outcome>> {
        parser::split_statements(script)
            .into_iter()
            .map(|sql| {
                let result = self.parse(sql);
                if let Err(e) = &result {
                    warn!(statement = sql, error = %e, "statement failed");
                }
                result
            })
            .collect()
    }

    fn execute(&mut self, statement: Statement) -> Result<Outcome> {
        match statement {
            Statement::CreateTable(create) => self.create_table(create),
            Statement::DropTable(name) => self.drop_table(&name),
            Statement::InsertInto(insert) => self.insert(insert),
            Statement::Select(select) => self.select(&select).map(Outcome::Rows),
            Statement::Delete(delete) => self.delete(delete),
            Statement::Update(update) => self.update(update),
        }
    }

    fn create_table(&mut self, create: CreateTable) -> Result<Outcome> {
        if self.tables.contains_key(&create.name) {
            return Err(DbError::logic(format!(
                "Table {} already exists in the database",
                create.name
            )));
        }

        let mut table = Table::from_defs(create.name.clone(), create.columns)?;
        for fk in &create.foreign_keys {
            let idx = table.schema().index_of(&fk.column).ok_or_else(|| {
                DbError::logic(format!("Foreign key on undeclared column {}", fk.column))
            })?;
            let referenced = self.table(&fk.ref_table)?;
            let ref_idx = referenced.schema().resolve(&fk.ref_column)?;

            let (own, other) = (
                table.schema().column(idx).data_type,
                referenced.schema().column(ref_idx).data_type,
            );
            if !own.same_kind(&other) {
                return Err(DbError::logic(format!(
                    "Foreign key {} of type {own} cannot reference {}.{} of type {other}",
                    fk.column, fk.ref_table, fk.ref_column
                )));
            }
            table.schema_mut().column_mut(idx).foreign_key = Some(ForeignKey {
                table: fk.ref_table.clone(),
                column: ref_idx,
            });
        }

        info!(table = %create.name, columns = table.schema().len(), "table created");
        self.tables.insert(create.name.clone(), table);
        Ok(Outcome::Created(create.name))
    }

    fn drop_table(&mut self, name: &str) -> Result<Outcome> {
        if self.tables.remove(name).is_none() {
            return Err(DbError::logic(format!(
                "Table {name} does not exist in the database"
            )));
        }
        info!(table = name, "table dropped");
        Ok(Outcome::Dropped {
            table: name.to_string(),
            remaining: self.list_tables().into_iter().map(String::from).collect(),
        })
    }

    fn insert(&mut self, insert: InsertInto) -> Result<Outcome> {
        debug!(table = %insert.table, "insert");
        let table = self.table_mut(&insert.table)?;
        table.add_row(&insert.values, insert.columns.as_deref())?;
        Ok(Outcome::Inserted(1))
    }

    fn select(&self, select: &Select) -> Result<QueryResult> {
        debug!(table = %select.table, join = select.join.is_some(), "select");
        let columns = match &select.columns {
            ColumnsSelect::Star => None,
            ColumnsSelect::ColumnsNames(names) => Some(names.as_slice()),
        };

        let base = self.table(&select.table)?;
        let Some(clause) = &select.join else {
            return base.select(columns, &select.where_clause);
        };

        let other = self.table(&clause.table)?;
        let ((t1, c1), (t2, c2)) = &clause.on;
        let (left_col, right_col) = if *t1 == base.name && *t2 == other.name {
            (c1, c2)
        } else if *t2 == base.name && *t1 == other.name {
            (c2, c1)
        } else {
            return Err(DbError::logic(format!(
                "ON clause must compare columns of {} and {}",
                base.name, other.name
            )));
        };

        let joined = match clause.kind {
            JoinKind::Inner => join::inner_join(base, other, left_col, right_col)?,
            JoinKind::Left => join::left_join(base, other, left_col, right_col)?,
            JoinKind::Right => join::right_join(base, other, left_col, right_col)?,
        };
        joined.select(columns, &select.where_clause)
    }

    fn delete(&mut self, delete: Delete) -> Result<Outcome> {
        debug!(table = %delete.table, "delete");
        let table = self.table_mut(&delete.table)?;
        Ok(Outcome::Deleted(table.delete_rows(&delete.where_clause)?))
    }

    fn update(&mut self, update: Update) -> Result<Outcome> {
        debug!(table = %update.table, "update");
        let table = self.table_mut(&update.table)?;
        Ok(Outcome::Updated(
            table.update_values(&update.assignments, &update.where_clause)?,
        ))
    }

    /// Writes every table to `path`.
    ///
    /// # Errors
    /// Returns [DbError::Logic] if a stored text cannot be represented in the
    /// file, and [DbError::WriteFile] if the file cannot be written.
    pub fn save_db(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tables: Vec<&Table> = self
            .list_tables()
            .into_iter()
            .filter_map(|name| self.tables.get(name))
            .collect();
        persist::save(path, &self.name, tables.into_iter())?;
        info!(path = %path.display(), tables = self.tables.len(), "database saved");
        Ok(())
    }

    /// Replaces the name and all tables of the database with the content of
    /// `path`. Nothing changes if the file cannot be read completely.
    ///
    /// # Errors
    /// Returns [DbError::WriteFile] if the file cannot be read and
    /// [DbError::CorruptFile] if its content is invalid.
    pub fn load_db(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let (name, tables) = persist::load(path)?;

        self.name = name;
        self.tables = tables.into_iter().map(|t| (t.name.clone(), t)).collect();
        info!(path = %path.display(), tables = self.tables.len(), "database loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::OperatorTable;
    use tempfile::tempdir;

    fn rows(db: &Database, sql: &str) -> Vec<Vec<Value>> {
        db.query(sql).unwrap().rows
    }

    fn int(i: i32) -> Value {
        Value::Int(i)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    fn school() -> Database {
        let mut db = Database::new();
        let results = db.run_script(
            "CREATE TABLE Students(ISU INT PRIMARY KEY, age INT, name VARCHAR(255));
             INSERT INTO Students VALUES (368050, 27, 'Nikita');
             INSERT INTO Students VALUES (370213, 31678, 'Matvey');
             INSERT INTO Students VALUES (111111, 18, 'Alex');
             INSERT INTO Students VALUES (789213, -100, 'Stas');
             CREATE TABLE mark(ISU INT, mark INT);
             INSERT INTO mark VALUES (368050, 5);
             INSERT INTO mark VALUES (111111, 4);
             INSERT INTO mark VALUES (999999, 3);",
        );
        assert!(results.iter().all(Result::is_ok));
        db
    }

    #[test]
    fn test_create_insert_select() {
        let mut db = Database::new();
        assert_eq!(
            db.parse("CREATE TABLE Students(ISU INT PRIMARY KEY, age INT, name VARCHAR(255));")
                .unwrap(),
            Outcome::Created("Students".into())
        );
        assert_eq!(
            db.parse("INSERT INTO Students VALUES (368050, 27, 'Nikita');")
                .unwrap(),
            Outcome::Inserted(1)
        );

        let result = db.query("SELECT * FROM Students;").unwrap();
        assert_eq!(result.columns, vec!["ISU", "age", "name"]);
        assert_eq!(result.rows, vec![vec![int(368050), int(27), text("Nikita")]]);

        let rendered = result.to_string();
        let words: Vec<Vec<&str>> = rendered
            .lines()
            .map(|l| l.split_whitespace().collect())
            .collect();
        assert_eq!(words, vec![vec!["ISU", "age", "name"], vec!["368050", "27", "Nikita"]]);
    }

    #[test]
    fn test_query_result_display() {
        let mut db = Database::new();
        db.run_script(
            "CREATE TABLE t (id INT, name VARCHAR(10));
             INSERT INTO t VALUES (1, 'Alexander');
             INSERT INTO t (id) VALUES (22);",
        );
        let output = db.query("SELECT * FROM t;").unwrap().to_string();
        assert_eq!(output, "id   name\n1    Alexander\n22   NULL");
    }

    #[test]
    fn test_delete_where() {
        let mut db = school();
        assert_eq!(
            db.parse("DELETE FROM Students WHERE age < 20;").unwrap(),
            Outcome::Deleted(2)
        );
        assert_eq!(
            rows(&db, "SELECT age FROM Students;"),
            vec![vec![int(27)], vec![int(31678)]]
        );
    }

    #[test]
    fn test_inner_join() {
        let db = school();
        assert_eq!(
            rows(
                &db,
                "SELECT Students.ISU, mark.mark FROM Students INNER JOIN mark ON Students.ISU = mark.ISU;"
            ),
            vec![vec![int(368050), int(5)], vec![int(111111), int(4)]]
        );
        // ON pair written the other way round.
        assert_eq!(
            rows(
                &db,
                "SELECT Students.ISU, mark FROM Students JOIN mark ON mark.ISU = Students.ISU;"
            )
            .len(),
            2
        );
    }

    #[test]
    fn test_left_join() {
        let db = school();
        let result = rows(
            &db,
            "SELECT Students.ISU, mark.mark FROM Students LEFT JOIN mark ON Students.ISU = mark.ISU;",
        );
        assert_eq!(
            result,
            vec![
                vec![int(368050), int(5)],
                vec![int(370213), Value::Null],
                vec![int(111111), int(4)],
                vec![int(789213), Value::Null],
            ]
        );
    }

    #[test]
    fn test_right_join() {
        let db = school();
        let result = rows(
            &db,
            "SELECT Students.ISU, mark.mark FROM Students RIGHT JOIN mark ON Students.ISU = mark.ISU;",
        );
        assert_eq!(
            result,
            vec![
                vec![int(368050), int(5)],
                vec![int(111111), int(4)],
                vec![Value::Null, int(3)],
            ]
        );

        let full = rows(
            &db,
            "SELECT Students.ISU, age, name FROM Students RIGHT JOIN mark ON Students.ISU = mark.ISU WHERE mark = 3;",
        );
        assert_eq!(full, vec![vec![Value::Null, Value::Null, Value::Null]]);
    }

    #[test]
    fn test_join_with_where() {
        let db = school();
        let result = rows(
            &db,
            "SELECT name, mark FROM Students LEFT JOIN mark ON Students.ISU = mark.ISU WHERE mark IS NULL OR mark > 4;",
        );
        assert_eq!(
            result,
            vec![
                vec![text("Nikita"), int(5)],
                vec![text("Matvey"), Value::Null],
                vec![text("Stas"), Value::Null],
            ]
        );
    }

    #[test]
    fn test_join_errors() {
        let db = school();
        for sql in [
            "SELECT * FROM Students JOIN missing ON Students.ISU = missing.ISU;",
            "SELECT * FROM Students JOIN mark ON Students.ISU = other.ISU;",
            "SELECT * FROM Students JOIN mark ON Students.surname = mark.ISU;",
            "SELECT Students.mark FROM Students JOIN mark ON Students.ISU = mark.ISU;",
        ] {
            assert!(
                matches!(db.query(sql), Err(DbError::Logic(_))),
                "{sql:?} should fail"
            );
        }
    }

    #[test]
    fn test_update() {
        let mut db = school();
        assert_eq!(
            db.parse("UPDATE Students SET age = 28, name = 'Nick' WHERE ISU = 368050;")
                .unwrap(),
            Outcome::Updated(1)
        );
        assert_eq!(
            rows(&db, "SELECT age, name FROM Students WHERE ISU = 368050;"),
            vec![vec![int(28), text("Nick")]]
        );

        assert_eq!(
            db.parse("UPDATE mark SET mark = 2;").unwrap(),
            Outcome::Updated(3)
        );
        assert!(
            rows(&db, "SELECT mark FROM mark;")
                .iter()
                .all(|r| r[0] == int(2))
        );
    }

    #[test]
    fn test_update_constraints_keep_state() {
        let mut db = school();
        assert!(matches!(
            db.parse("UPDATE Students SET ISU = 1;"),
            Err(DbError::Logic(_))
        ));
        assert!(matches!(
            db.parse("UPDATE Students SET age = 1, age = 2;"),
            Err(DbError::Logic(_))
        ));
        assert!(matches!(
            db.parse("UPDATE Students SET age = 'old';"),
            Err(DbError::Syntax(_))
        ));
        assert_eq!(
            rows(&db, "SELECT ISU FROM Students WHERE ISU = 1;").len(),
            0
        );
    }

    #[test]
    fn test_insert_errors_keep_state() {
        let mut db = school();
        for (sql, logic) in [
            ("INSERT INTO Students VALUES (368050, 1, 'Dup');", true),
            ("INSERT INTO Students VALUES (1, 2);", true),
            ("INSERT INTO Students VALUES (1, 'x', 'y');", false),
            ("INSERT INTO Students (ISU, ISU) VALUES (1, 2);", true),
            ("INSERT INTO nowhere VALUES (1);", true),
            ("INSERT INTO Students VALUES (1, 2, 'x')", false),
        ] {
            match db.parse(sql) {
                Err(DbError::Logic(_)) if logic => {}
                Err(DbError::Syntax(_)) if !logic => {}
                other => panic!("unexpected result {other:?} for {sql:?}"),
            }
        }
        assert_eq!(db.get_table("Students").unwrap().row_count(), 4);
    }

    #[test]
    fn test_insert_partial_columns() {
        let mut db = school();
        db.parse("INSERT INTO Students(ISU, name) VALUES (35423, Alex);")
            .unwrap();
        assert_eq!(
            rows(&db, "SELECT name, age FROM Students WHERE ISU = 35423;"),
            vec![vec![text("Alex"), Value::Null]]
        );
    }

    #[test]
    fn test_not_null() {
        let mut db = Database::new();
        db.parse("CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(5) NOT NULL);")
            .unwrap();
        assert!(matches!(
            db.parse("INSERT INTO t (id) VALUES (1);"),
            Err(DbError::Logic(_))
        ));
        db.parse("INSERT INTO t VALUES (1, 'a');").unwrap();
        assert!(matches!(
            db.parse("UPDATE t SET name = NULL;"),
            Err(DbError::Logic(_))
        ));
    }

    #[test]
    fn test_create_and_drop_table() {
        let mut db = school();
        assert_eq!(db.list_tables(), vec!["Students", "mark"]);
        assert!(matches!(
            db.parse("CREATE TABLE mark (a INT);"),
            Err(DbError::Logic(_))
        ));
        assert!(matches!(
            db.parse("CREATE TABLE x (a INT PRIMARY KEY, b INT PRIMARY KEY);"),
            Err(DbError::Logic(_))
        ));

        let outcome = db.parse("DROP TABLE mark;").unwrap();
        assert_eq!(
            outcome.to_string(),
            "Dropped table mark. Remaining tables:\nStudents"
        );
        let outcome = db.parse("DROP TABLE Students;").unwrap();
        assert_eq!(
            outcome.to_string(),
            "Dropped table Students. There are no remaining tables."
        );
        assert!(matches!(
            db.parse("DROP TABLE Students;"),
            Err(DbError::Logic(_))
        ));
        assert!(db.list_tables().is_empty());
    }

    #[test]
    fn test_foreign_keys() {
        let mut db = school();
        db.parse("CREATE TABLE exam (ISU INT, score DOUBLE, FOREIGN KEY (ISU) REFERENCES Students(ISU));")
            .unwrap();
        let exam = db.get_table("exam").unwrap();
        assert_eq!(
            exam.schema().column(0).foreign_key,
            Some(ForeignKey {
                table: "Students".into(),
                column: 0,
            })
        );

        for sql in [
            "CREATE TABLE e1 (ISU INT, FOREIGN KEY (ISU) REFERENCES nowhere(ISU));",
            "CREATE TABLE e2 (ISU INT, FOREIGN KEY (ISU) REFERENCES Students(surname));",
            "CREATE TABLE e3 (ISU INT, FOREIGN KEY (other) REFERENCES Students(ISU));",
            "CREATE TABLE e4 (ISU DOUBLE, FOREIGN KEY (ISU) REFERENCES Students(ISU));",
        ] {
            assert!(
                matches!(db.parse(sql), Err(DbError::Logic(_))),
                "{sql:?} should fail"
            );
        }
        assert_eq!(db.list_tables(), vec!["Students", "exam", "mark"]);
    }

    #[test]
    fn test_query_rejects_other_statements() {
        let db = school();
        assert!(matches!(
            db.query("DELETE FROM Students;"),
            Err(DbError::Logic(_))
        ));
        assert!(matches!(
            db.query("SELECT * FROM nowhere;"),
            Err(DbError::Logic(_))
        ));
    }

    #[test]
    fn test_run_script_continues_after_errors() {
        let mut db = Database::new();
        let results = db.run_script(
            "CREATE TABLE t (a INT);
             INSERT INTO t VALUES ('x');
             INSERT INTO t VALUES (1);
             SELECT * FROM t",
        );
        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(DbError::Syntax(_))));
        assert!(results[2].is_ok());
        assert!(matches!(results[3], Err(DbError::Syntax(_))));
        assert_eq!(db.get_table("t").unwrap().row_count(), 1);
    }

    #[test]
    fn test_custom_precedence() {
        let config = DatabaseConfig {
            name: "custom".into(),
            operators: OperatorTable {
                not: 3,
                and: 1,
                or: 2,
            },
        };
        let mut db = Database::with_config(config);
        db.run_script(
            "CREATE TABLE t (a INT, b INT);
             INSERT INTO t VALUES (1, 0);
             INSERT INTO t VALUES (0, 0);",
        );
        // Read as a = 0 AND (b = 1 OR a = 1) with OR binding tighter.
        let sql = "SELECT a FROM t WHERE a = 0 AND b = 1 OR a = 1;";
        assert!(db.query(sql).unwrap().rows.is_empty());
        assert_eq!(db.name(), "custom");

        let default = school();
        assert_eq!(default.name(), "DataBase");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("school.db");

        let mut db = school();
        db.parse("UPDATE Students SET name = 'Konstantin' WHERE ISU = 111111;")
            .unwrap();
        db.save_db(&path).unwrap();

        let mut restored = Database::with_config(DatabaseConfig::with_name("other"));
        restored.parse("CREATE TABLE stale (a INT);").unwrap();
        restored.load_db(&path).unwrap();

        assert_eq!(restored.name(), "DataBase");
        assert_eq!(restored.list_tables(), vec!["Students", "mark"]);
        for sql in [
            "SELECT * FROM Students;",
            "SELECT * FROM mark;",
            "SELECT name, mark FROM Students LEFT JOIN mark ON Students.ISU = mark.ISU;",
        ] {
            assert_eq!(db.query(sql).unwrap(), restored.query(sql).unwrap());
        }
        assert!(matches!(
            restored.parse("INSERT INTO Students VALUES (111111, 1, 'x');"),
            Err(DbError::Logic(_))
        ));
    }

    #[test]
    fn test_saved_values_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("measures.db");

        let mut db = Database::new();
        let results = db.run_script(
            "CREATE TABLE m (id INT, f FLOAT, d DOUBLE, note VARCHAR(40));
             INSERT INTO m VALUES (1, 2.5, -0.125, 'fine');",
        );
        assert!(results.iter().all(Result::is_ok));
        let huge = format!("1{}", "0".repeat(50));
        assert!(matches!(
            db.parse(&format!("INSERT INTO m VALUES (2, {huge}, 1, 'x');")),
            Err(DbError::Syntax(_))
        ));
        assert!(matches!(
            db.parse(&format!("UPDATE m SET f = {huge} WHERE id = 1;")),
            Err(DbError::Syntax(_))
        ));
        db.parse(&format!("INSERT INTO m VALUES (3, 1, {huge}, 'big');"))
            .unwrap();

        db.save_db(&path).unwrap();
        let mut restored = Database::new();
        restored.load_db(&path).unwrap();
        let sql = "SELECT * FROM m;";
        assert_eq!(db.query(sql).unwrap(), restored.query(sql).unwrap());

        db.parse("INSERT INTO m VALUES (4, 1, 1, 'one\ntwo');").unwrap();
        let rejected = dir.path().join("rejected.db");
        assert!(matches!(db.save_db(&rejected), Err(DbError::Logic(_))));
        assert!(!rejected.exists());
    }

    #[test]
    fn test_failed_load_keeps_tables() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.db");
        std::fs::write(&path, "DataBase\n3\n").unwrap();

        let mut db = school();
        assert!(matches!(
            db.load_db(&path),
            Err(DbError::CorruptFile { .. })
        ));
        assert!(matches!(
            db.load_db(dir.path().join("missing.db")),
            Err(DbError::WriteFile { .. })
        ));
        assert_eq!(db.list_tables(), vec!["Students", "mark"]);
    }
}

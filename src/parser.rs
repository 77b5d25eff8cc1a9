use crate::ast::*;
use crate::condition::{self, Condition, OperatorTable};
use crate::error::{DbError, Result};
use crate::tokenizer::{Token, Tokenizer};
use crate::{ColumnDef, DataType};

/// Recursive-descent parser turning the tokens of one statement into a [Statement].
pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    operators: &'a OperatorTable,
}

/// Tokenizes and parses a single `;`-terminated statement.
///
/// # Example
/// ```
/// # use minidb::parser::parse_statement;
/// # use minidb::ast::Statement;
/// # use minidb::condition::OperatorTable;
/// let statement = parse_statement("DROP TABLE Students;", &OperatorTable::default()).unwrap();
/// assert_eq!(statement, Statement::DropTable("Students".into()));
/// ```
pub fn parse_statement(sql: &str, operators: &OperatorTable) -> Result<Statement> {
    let tokens = Tokenizer::new(sql).tokenize()?;
    Parser::new(tokens, operators).parse()
}

/// Splits a script into statements, each keeping its terminating `;`.
///
/// Semicolons inside quoted literals do not end a statement. Trailing text
/// without a `;` is returned as a last, unterminated piece.
pub fn split_statements(script: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in script.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, ';') => {
                let statement = script[start..=i].trim();
                if statement != ";" {
                    statements.push(statement);
                }
                start = i + 1;
            }
            (None, _) => {}
        }
    }

    let rest = script[start..].trim();
    if !rest.is_empty() {
        statements.push(rest);
    }
    statements
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token>, operators: &'a OperatorTable) -> Self {
        if tokens.last() != Some(&Token::Eof) {
            tokens.push(Token::Eof);
        }
        Self {
            tokens,
            position: 0,
            operators,
        }
    }

    pub fn parse(&mut self) -> Result<Statement> {
        let statement = match self.current_token() {
            Token::Create => self.parse_create_table(),
            Token::Drop => self.parse_drop_table(),
            Token::Insert => self.parse_insert(),
            Token::Select => self.parse_select(),
            Token::Delete => self.parse_delete(),
            Token::Update => self.parse_update(),
            token => Err(DbError::syntax(format!("Unexpected token: {token}"))),
        }?;

        if !matches!(self.current_token(), Token::Semicolon) {
            return Err(DbError::syntax(format!(
                "Expected ';' at the end of the statement, found {}",
                self.current_token()
            )));
        }
        self.advance();

        // Check we are at the end of the statement
        if !self.is_at_end() {
            return Err(DbError::syntax(format!(
                "Unexpected token after statement: {}",
                self.current_token()
            )));
        }

        Ok(statement)
    }

    //helpers
    fn current_token(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    /// Advances if the current token is `expected`.
    fn eat(&mut self, expected: &Token) -> bool {
        if self.current_token() == expected {
            self.advance();
            return true;
        }
        false
    }

    fn consume(&mut self, expected: Token) -> Result<()> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(DbError::syntax(format!(
                "Expected {expected}, found {}",
                self.current_token()
            )))
        }
    }

    fn consume_ident(&mut self) -> Result<String> {
        match self.current_token() {
            Token::Ident(string) => {
                let string = string.clone();
                self.advance();
                Ok(string)
            }
            token => Err(DbError::syntax(format!(
                "Expected identifier, found {token}"
            ))),
        }
    }

    /// `column` or `table.column`
    fn consume_column_ref(&mut self) -> Result<String> {
        let first = self.consume_ident()?;
        if self.eat(&Token::Dot) {
            let column = self.consume_ident()?;
            return Ok(format!("{first}.{column}"));
        }
        Ok(first)
    }

    fn consume_literal(&mut self) -> Result<String> {
        let text = match self.current_token() {
            Token::Number(s) | Token::String(s) | Token::Ident(s) => s.clone(),
            Token::Null => "NULL".into(),
            Token::True => "true".into(),
            Token::False => "false".into(),
            token => {
                return Err(DbError::syntax(format!("Expected a value, found {token}")));
            }
        };
        self.advance();
        Ok(text)
    }

    fn consume_data_type(&mut self) -> Result<DataType> {
        let data_type = match self.current_token() {
            Token::Bool => DataType::Bool,
            Token::Int => DataType::Int,
            Token::Float => DataType::Float,
            Token::Double => DataType::Double,
            Token::Varchar => {
                self.advance();
                self.consume(Token::LeftParen)?;
                let len = match self.current_token() {
                    Token::Number(n) => n.parse::<usize>().map_err(|_| {
                        DbError::syntax(format!("Invalid VARCHAR length {n}"))
                    })?,
                    token => {
                        return Err(DbError::syntax(format!(
                            "Expected VARCHAR length, found {token}"
                        )));
                    }
                };
                self.advance();
                self.consume(Token::RightParen)?;
                return Ok(DataType::Varchar(len));
            }
            token => {
                return Err(DbError::syntax(format!(
                    "current token {token} is not a column type"
                )));
            }
        };
        self.advance();
        Ok(data_type)
    }

    /// Comma-separated list between parentheses.
    fn parse_list<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        self.consume(Token::LeftParen)?;
        let mut items = vec![item(self)?];
        while self.eat(&Token::Comma) {
            items.push(item(self)?);
        }
        self.consume(Token::RightParen)?;
        Ok(items)
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.consume_ident()?;
        let data_type = self.consume_data_type()?;

        let (mut not_null, mut primary_key) = (false, false);
        loop {
            if self.eat(&Token::Not) {
                self.consume(Token::Null)?;
                not_null = true;
            } else if self.eat(&Token::Primary) {
                self.consume(Token::Key)?;
                primary_key = true;
            } else {
                break;
            }
        }

        Ok(ColumnDef {
            name,
            data_type,
            not_null,
            primary_key,
        })
    }

    fn parse_foreign_key(&mut self) -> Result<ForeignKeyDef> {
        self.consume(Token::Foreign)?;
        self.consume(Token::Key)?;
        self.consume(Token::LeftParen)?;
        let column = self.consume_ident()?;
        self.consume(Token::RightParen)?;
        self.consume(Token::References)?;
        let ref_table = self.consume_ident()?;
        self.consume(Token::LeftParen)?;
        let ref_column = self.consume_ident()?;
        self.consume(Token::RightParen)?;
        Ok(ForeignKeyDef {
            column,
            ref_table,
            ref_column,
        })
    }

    fn parse_create_table(&mut self) -> Result<Statement> {
        self.consume(Token::Create)?; // advance if CREATE
        self.consume(Token::Table)?; // advance if TABLE
        let name = self.consume_ident()?;
        self.consume(Token::LeftParen)?;

        let mut columns = vec![];
        let mut foreign_keys = vec![];
        loop {
            if matches!(self.current_token(), Token::Foreign) {
                foreign_keys.push(self.parse_foreign_key()?);
            } else {
                columns.push(self.parse_column_def()?);
            }
            match self.current_token() {
                Token::RightParen => {
                    self.advance();
                    break;
                }
                Token::Comma => {
                    self.advance();
                    // trailing comma
                    if self.eat(&Token::RightParen) {
                        break;
                    }
                }
                token => return Err(DbError::syntax(format!("Expected ',' or ')', found {token}"))),
            }
        }

        Ok(Statement::CreateTable(CreateTable {
            name,
            columns,
            foreign_keys,
        }))
    }

    fn parse_drop_table(&mut self) -> Result<Statement> {
        self.consume(Token::Drop)?;
        self.consume(Token::Table)?;
        Ok(Statement::DropTable(self.consume_ident()?))
    }

    fn parse_insert(&mut self) -> Result<Statement> {
        self.consume(Token::Insert)?;
        self.consume(Token::Into)?;
        let table = self.consume_ident()?;

        let columns = if matches!(self.current_token(), Token::LeftParen) {
            Some(self.parse_list(Self::consume_ident)?)
        } else {
            None
        };

        self.consume(Token::Values)?;
        let values = self.parse_list(Self::consume_literal)?;

        Ok(Statement::InsertInto(InsertInto {
            table,
            columns,
            values,
        }))
    }

    fn parse_select(&mut self) -> Result<Statement> {
        self.consume(Token::Select)?;

        let columns = if self.eat(&Token::Star) {
            ColumnsSelect::Star
        } else {
            let mut names = vec![self.consume_column_ref()?];
            while self.eat(&Token::Comma) {
                names.push(self.consume_column_ref()?);
            }
            ColumnsSelect::ColumnsNames(names)
        };

        self.consume(Token::From)?;
        let table = self.consume_ident()?;
        let join = self.parse_join()?;
        let where_clause = self.parse_where()?;

        Ok(Statement::Select(Select {
            columns,
            table,
            join,
            where_clause,
        }))
    }

    fn parse_join(&mut self) -> Result<Option<JoinClause>> {
        let kind = match self.current_token() {
            Token::Inner | Token::Join => JoinKind::Inner,
            Token::Left => JoinKind::Left,
            Token::Right => JoinKind::Right,
            _ => return Ok(None),
        };
        if !matches!(self.current_token(), Token::Join) {
            self.advance();
        }
        self.consume(Token::Join)?;

        let table = self.consume_ident()?;
        self.consume(Token::On)?;
        let lhs = self.parse_qualified()?;
        self.consume(Token::Equal)?;
        let rhs = self.parse_qualified()?;

        Ok(Some(JoinClause {
            kind,
            table,
            on: (lhs, rhs),
        }))
    }

    fn parse_qualified(&mut self) -> Result<(String, String)> {
        let table = self.consume_ident()?;
        self.consume(Token::Dot)?;
        let column = self.consume_ident()?;
        Ok((table, column))
    }

    /// Optional `WHERE` clause, made of every token up to the `;`.
    fn parse_where(&mut self) -> Result<Condition> {
        if !self.eat(&Token::Where) {
            return Ok(Condition::always());
        }
        let start = self.position;
        while !matches!(self.current_token(), Token::Semicolon | Token::Eof) {
            self.advance();
        }
        condition::compile_tokens(&self.tokens[start..self.position], self.operators)
    }

    fn parse_delete(&mut self) -> Result<Statement> {
        self.consume(Token::Delete)?;
        self.consume(Token::From)?;
        let table = self.consume_ident()?;
        let where_clause = self.parse_where()?;
        Ok(Statement::Delete(Delete {
            table,
            where_clause,
        }))
    }

    fn parse_update(&mut self) -> Result<Statement> {
        self.consume(Token::Update)?;
        let table = self.consume_ident()?;
        self.consume(Token::Set)?;

        let mut assignments = vec![];
        loop {
            let column = self.consume_column_ref()?;
            self.consume(Token::Equal)?;
            assignments.push((column, self.consume_literal()?));
            if !self.eat(&Token::Comma) {
                break;
            }
        }

        let where_clause = self.parse_where()?;
        Ok(Statement::Update(Update {
            table,
            assignments,
            where_clause,
        }))
    }
}

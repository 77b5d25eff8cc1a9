use std::fmt;

use crate::error::{DbError, Result};

/// Represents the smallest meaningful units (atoms) of the SQL language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- SQL Keywords ---
    Create,
    Table,
    Drop,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Delete,
    Update,
    Set,
    Join,
    Inner,
    Left,
    Right,
    On,
    Primary,
    Foreign,
    Key,
    References,
    And,
    Or,
    Not,
    Is,
    Null,

    // --- Data Types ---
    Bool,
    Int,
    Float,
    Double,
    Varchar,

    // --- Identifiers & Literals ---
    /// A name representing a table or a column (e.g., `Students`, `ISU`).
    Ident(String),
    /// A numeric literal kept in its source form, sign included (e.g., `-100`, `2.5`).
    Number(String),
    /// A string literal defined between single or double quotes, quotes removed.
    /// There is no escape sequence.
    String(String),
    /// The boolean literal `TRUE`.
    True,
    /// The boolean literal `FALSE`.
    False,

    // --- Symbols ---
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Comma `,`
    Comma,
    /// Semicolon `;`
    Semicolon,
    /// Dot `.` between a table and a column name
    Dot,
    /// Wildcard symbol `*`
    Star,
    /// `=`
    Equal,
    /// `<>` or `!=`
    NotEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Lower,
    /// `<=`
    LowerEqual,

    // --- Special ---
    /// Represents the End Of File/Input.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(s) | Self::Number(s) => write!(f, "{s}"),
            Self::String(s) => write!(f, "'{s}'"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::Comma => write!(f, ","),
            Self::Semicolon => write!(f, ";"),
            Self::Dot => write!(f, "."),
            Self::Star => write!(f, "*"),
            Self::Equal => write!(f, "="),
            Self::NotEqual => write!(f, "<>"),
            Self::Greater => write!(f, ">"),
            Self::GreaterEqual => write!(f, ">="),
            Self::Lower => write!(f, "<"),
            Self::LowerEqual => write!(f, "<="),
            Self::Eof => write!(f, "end of input"),
            keyword => write!(f, "{}", format!("{keyword:?}").to_uppercase()),
        }
    }
}

/// A lexical scanner (lexer) that converts a raw SQL string into a sequence of [Token]s.
pub struct Tokenizer {
    /// The input string stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl Tokenizer {
    /// Creates a new Tokenizer for the given input string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns a vector of tokens.
    ///
    /// # Errors
    /// Returns [DbError::Syntax] if an invalid character is encountered or if a
    /// literal (like a string) is malformed.
    ///
    /// # Example
    /// ```
    /// # use minidb::tokenizer::{Tokenizer, Token};
    /// let mut t = Tokenizer::new("SELECT *");
    /// let tokens = t.tokenize().unwrap();
    /// assert_eq!(tokens[0], Token::Select);
    /// ```
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        tokens.push(Token::Eof);
        Ok(tokens)
    }

    /// Identifies the next token based on the character at the current position.
    fn next_token(&mut self) -> Result<Token> {
        let ch = self.current_char();

        match ch {
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            ',' => self.single(Token::Comma),
            ';' => self.single(Token::Semicolon),
            '.' => self.single(Token::Dot),
            '*' => self.single(Token::Star),
            '=' => self.single(Token::Equal),
            '>' => {
                self.advance();
                if self.next_is('=') {
                    return Ok(Token::GreaterEqual);
                }
                Ok(Token::Greater)
            }
            '<' => {
                self.advance();
                if self.next_is('=') {
                    return Ok(Token::LowerEqual);
                }
                if self.next_is('>') {
                    return Ok(Token::NotEqual);
                }
                Ok(Token::Lower)
            }
            '!' => {
                self.advance();
                if self.next_is('=') {
                    return Ok(Token::NotEqual);
                }
                Err(DbError::syntax("character '!' must be followed by '='"))
            }
            '+' | '-' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number()
            }
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier()),
            c if c.is_ascii_digit() => self.read_number(),
            '\'' | '"' => self.read_string(ch),
            _ => Err(DbError::syntax(format!("character {ch:?} is not supported"))),
        }
    }

    // --- Navigation Helpers ---

    /// Returns the character at the current position.
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Moves the cursor forward by one character.
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Consumes the current character if it is `expected`.
    fn next_is(&mut self, expected: char) -> bool {
        if !self.is_at_end() && self.current_char() == expected {
            self.advance();
            return true;
        }
        false
    }

    fn single(&mut self, token: Token) -> Result<Token> {
        self.advance();
        Ok(token)
    }

    /// Checks if the cursor has reached the end of the input.
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Consumes any whitespace characters (spaces, tabs, newlines).
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    // --- Extraction Logic ---

    /// Reads a sequence of alphanumeric characters and determines if it's
    /// a reserved SQL keyword or a user-defined identifier.
    ///
    /// Keywords are matched case-insensitively.
    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while !self.is_at_end()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            ident.push(self.current_char());
            self.advance();
        }

        match ident.to_uppercase().as_str() {
            "CREATE" => Token::Create,
            "TABLE" => Token::Table,
            "DROP" => Token::Drop,
            "INSERT" => Token::Insert,
            "INTO" => Token::Into,
            "VALUES" => Token::Values,
            "SELECT" => Token::Select,
            "FROM" => Token::From,
            "WHERE" => Token::Where,
            "DELETE" => Token::Delete,
            "UPDATE" => Token::Update,
            "SET" => Token::Set,
            "JOIN" => Token::Join,
            "INNER" => Token::Inner,
            "LEFT" => Token::Left,
            "RIGHT" => Token::Right,
            "ON" => Token::On,
            "PRIMARY" => Token::Primary,
            "FOREIGN" => Token::Foreign,
            "KEY" => Token::Key,
            "REFERENCES" => Token::References,
            "AND" => Token::And,
            "OR" => Token::Or,
            "NOT" => Token::Not,
            "IS" => Token::Is,
            "NULL" => Token::Null,
            "BOOL" => Token::Bool,
            "INT" => Token::Int,
            "FLOAT" => Token::Float,
            "DOUBLE" => Token::Double,
            "VARCHAR" => Token::Varchar,
            "TRUE" => Token::True,
            "FALSE" => Token::False,
            _ => Token::Ident(ident),
        }
    }

    /// Reads a numeric literal with an optional sign and fractional part.
    /// The text is kept as written; typing happens against the column it targets.
    fn read_number(&mut self) -> Result<Token> {
        let mut number = String::new();

        if matches!(self.current_char(), '+' | '-') {
            number.push(self.current_char());
            self.advance();
        }

        let mut has_dot = false;
        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot && self.peek_char().is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if !self.is_at_end() && self.current_char() == '.' && has_dot {
            return Err(DbError::syntax("multiple dots are not allowed for a number"));
        }
        if !self.is_at_end() && (self.current_char().is_alphabetic() || self.current_char() == '_') {
            return Err(DbError::syntax(format!(
                "invalid numeric literal starting with {number:?}"
            )));
        }

        Ok(Token::Number(number))
    }

    /// Reads a string literal enclosed in `quote` characters.
    fn read_string(&mut self, quote: char) -> Result<Token> {
        self.advance(); // Skip the opening quote

        let mut string = String::new();
        while !self.is_at_end() && self.current_char() != quote {
            string.push(self.current_char());
            self.advance();
        }

        if self.is_at_end() {
            return Err(DbError::syntax("Unterminated string"));
        }

        // Skip the closing quote
        self.advance();

        Ok(Token::String(string))
    }
}

//! Compilation of `WHERE` clauses into postfix (Reverse Polish) order.
//!
//! The clause is split into the keyword operators `NOT`, `AND`, `OR`,
//! parentheses, and opaque comparison leaves such as `age < 20`. Leaves go
//! straight to the output while operators are routed through a stack
//! (shunting-yard), giving for `a = 1 AND b = 2 OR c = 3` the sequence
//! `a = 1`, `b = 2`, `AND`, `c = 3`, `OR`.

use std::fmt;

use crate::error::{DbError, Result};
use crate::tokenizer::{Token, Tokenizer};

/// The keyword operators of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    Not,
    And,
    Or,
}

impl LogicOp {
    /// Number of operands popped by the operator.
    pub fn arity(self) -> usize {
        match self {
            Self::Not => 1,
            Self::And | Self::Or => 2,
        }
    }
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Not => write!(f, "NOT"),
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// Precedence of the logical operators. Higher binds tighter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorTable {
    pub not: u8,
    pub and: u8,
    pub or: u8,
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self {
            not: 3,
            and: 2,
            or: 1,
        }
    }
}

impl OperatorTable {
    pub fn precedence(&self, op: LogicOp) -> u8 {
        match op {
            LogicOp::Not => self.not,
            LogicOp::And => self.and,
            LogicOp::Or => self.or,
        }
    }
}

/// The comparators allowed inside a comparison leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    Is,
    IsNot,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
        };
        write!(f, "{s}")
    }
}

/// One side of a comparison, as written. Whether it names a column or is a
/// literal is only decided against a table schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    /// Text with surrounding quotes removed.
    pub text: String,
    pub quoted: bool,
}

impl Operand {
    pub fn bare(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
        }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: true,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "'{}'", self.text)
        } else {
            write!(f, "{}", self.text)
        }
    }
}

/// An opaque leaf of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `lhs op rhs`, e.g. `age < 20`.
    Compare {
        lhs: Operand,
        op: CmpOp,
        rhs: Operand,
    },
    /// A stand-alone operand such as `true` or `1`, coerced to a boolean.
    Unary(Operand),
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { lhs, op, rhs } => write!(f, "{lhs} {op} {rhs}"),
            Self::Unary(operand) => write!(f, "{operand}"),
        }
    }
}

/// An element of a postfix condition.
#[derive(Debug, Clone, PartialEq)]
pub enum CondToken {
    Leaf(Predicate),
    Op(LogicOp),
}

impl fmt::Display for CondToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(predicate) => write!(f, "{predicate}"),
            Self::Op(op) => write!(f, "{op}"),
        }
    }
}

/// A condition in postfix order.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    postfix: Vec<CondToken>,
}

impl Condition {
    /// The condition used when a statement has no `WHERE` clause.
    pub fn always() -> Self {
        Self {
            postfix: vec![CondToken::Leaf(Predicate::Unary(Operand::bare("true")))],
        }
    }

    pub fn postfix(&self) -> &[CondToken] {
        &self.postfix
    }

    /// Builds a condition from tokens already in postfix order.
    ///
    /// # Errors
    /// Returns [DbError::Syntax] if the sequence does not reduce to exactly one value.
    pub fn from_postfix(postfix: Vec<CondToken>) -> Result<Self> {
        check_arity(&postfix)?;
        Ok(Self { postfix })
    }
}

/// Compiles the text of a condition.
///
/// # Example
/// ```
/// # use minidb::condition::{compile, OperatorTable};
/// let condition = compile("a = 1 AND b = 2 OR c = 3", &OperatorTable::default()).unwrap();
/// let postfix: Vec<String> = condition.postfix().iter().map(|t| t.to_string()).collect();
/// assert_eq!(postfix, ["a = 1", "b = 2", "AND", "c = 3", "OR"]);
/// ```
pub fn compile(text: &str, operators: &OperatorTable) -> Result<Condition> {
    let mut tokens = Tokenizer::new(text).tokenize()?;
    tokens.pop(); // Eof
    compile_tokens(&tokens, operators)
}

/// Compiles an infix condition given as tokens (without the terminating `;`).
pub(crate) fn compile_tokens(tokens: &[Token], operators: &OperatorTable) -> Result<Condition> {
    enum Pending {
        Op(LogicOp),
        Paren,
    }

    let mut output = Vec::new();
    let mut stack: Vec<Pending> = Vec::new();
    let mut leaf: Vec<&Token> = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        let op = match token {
            Token::Not if matches!(leaf.last(), Some(Token::Is)) => {
                // `IS NOT` belongs to the comparison.
                leaf.push(token);
                continue;
            }
            Token::Not => Some(LogicOp::Not),
            Token::And => Some(LogicOp::And),
            Token::Or => Some(LogicOp::Or),
            Token::LeftParen | Token::RightParen => None,
            _ => {
                leaf.push(token);
                continue;
            }
        };

        if !leaf.is_empty() {
            output.push(CondToken::Leaf(parse_predicate(&leaf)?));
            leaf.clear();
        }

        match (op, token) {
            (Some(LogicOp::Not), _) => stack.push(Pending::Op(LogicOp::Not)),
            (Some(op), _) => {
                while let Some(&Pending::Op(top)) = stack.last() {
                    if operators.precedence(top) < operators.precedence(op) {
                        break;
                    }
                    output.push(CondToken::Op(top));
                    stack.pop();
                }
                stack.push(Pending::Op(op));
            }
            (None, Token::LeftParen) => stack.push(Pending::Paren),
            (None, _) => loop {
                match stack.pop() {
                    Some(Pending::Op(top)) => output.push(CondToken::Op(top)),
                    Some(Pending::Paren) => break,
                    None => return Err(DbError::syntax("Mismatched parentheses in condition")),
                }
            },
        }
    }

    if !leaf.is_empty() {
        output.push(CondToken::Leaf(parse_predicate(&leaf)?));
    }

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Op(op) => output.push(CondToken::Op(op)),
            Pending::Paren => return Err(DbError::syntax("Mismatched parentheses in condition")),
        }
    }

    Condition::from_postfix(output)
}

/// Checks that a postfix sequence leaves exactly one value on the stack.
fn check_arity(postfix: &[CondToken]) -> Result<()> {
    let mut depth = 0usize;
    for token in postfix {
        match token {
            CondToken::Leaf(_) => depth += 1,
            CondToken::Op(op) => {
                if depth < op.arity() {
                    return Err(DbError::syntax(format!(
                        "Invalid logic expression: {op} is missing an operand"
                    )));
                }
                depth -= op.arity() - 1;
            }
        }
    }
    if depth != 1 {
        return Err(DbError::syntax("Invalid logic expression"));
    }
    Ok(())
}

/// Parses the tokens of one leaf: `operand`, or `operand comparator operand`.
fn parse_predicate(tokens: &[&Token]) -> Result<Predicate> {
    let (lhs, rest) = parse_operand(tokens)?;

    let (op, rest) = match rest {
        [] => return Ok(Predicate::Unary(lhs)),
        [Token::Is, Token::Not, rest @ ..] => (CmpOp::IsNot, rest),
        [Token::Is, rest @ ..] => (CmpOp::Is, rest),
        [Token::Equal, rest @ ..] => (CmpOp::Eq, rest),
        [Token::NotEqual, rest @ ..] => (CmpOp::NotEq, rest),
        [Token::Greater, rest @ ..] => (CmpOp::Gt, rest),
        [Token::GreaterEqual, rest @ ..] => (CmpOp::GtEq, rest),
        [Token::Lower, rest @ ..] => (CmpOp::Lt, rest),
        [Token::LowerEqual, rest @ ..] => (CmpOp::LtEq, rest),
        [token, ..] => {
            return Err(DbError::syntax(format!(
                "Invalid logic expression: expected a comparator, found {token}"
            )));
        }
    };

    let (rhs, rest) = parse_operand(rest)?;
    if let Some(token) = rest.first() {
        return Err(DbError::syntax(format!(
            "Invalid logic expression: unexpected {token}"
        )));
    }
    Ok(Predicate::Compare { lhs, op, rhs })
}

fn parse_operand<'a, 't>(tokens: &'a [&'t Token]) -> Result<(Operand, &'a [&'t Token])> {
    match tokens {
        [Token::Ident(table), Token::Dot, Token::Ident(column), rest @ ..] => {
            Ok((Operand::bare(format!("{table}.{column}")), rest))
        }
        [Token::Ident(name), rest @ ..] => Ok((Operand::bare(name.clone()), rest)),
        [Token::Number(number), rest @ ..] => Ok((Operand::bare(number.clone()), rest)),
        [Token::String(s), rest @ ..] => Ok((Operand::quoted(s.clone()), rest)),
        [Token::Null, rest @ ..] => Ok((Operand::bare("NULL"), rest)),
        [Token::True, rest @ ..] => Ok((Operand::bare("true"), rest)),
        [Token::False, rest @ ..] => Ok((Operand::bare("false"), rest)),
        [token, ..] => Err(DbError::syntax(format!(
            "Invalid logic expression: unexpected {token}"
        ))),
        [] => Err(DbError::syntax("Invalid logic expression: missing operand")),
    }
}

//! Tokens and statements.
//!
//! A [`Statement`] keeps the full token stream plus, in parallel, the
//! operators extracted from it. The operator list exists only so the
//! evaluator can sort by priority.

use std::fmt;

use crate::{ErrorCode, Operator, Unresolved, Value, VisError, VisResult};

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// The smallest parsed unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Number, string, array or the result of a call or bracket.
    Value(Value),
    /// A name that resolves when its value is needed.
    Label(Unresolved),
    /// Operator or separator.
    Operator(Operator),
}

impl Token {
    /// The value behind this token: labels are looked up, values cloned.
    pub fn resolved(&self) -> VisResult<Value> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Label(label) => label.resolve(),
            Self::Operator(op) => Err(VisError::new(
                ErrorCode::OPERAND_IS_OPERATOR,
                format!("expected a value, got operator '{op}'"),
            )),
        }
    }

    pub fn as_operator(&self) -> Option<Operator> {
        match self {
            Self::Operator(op) => Some(*op),
            _ => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Self::Operator(_))
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Self::Operator(Operator::Separator))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(Value::String(s)) => write!(f, "{s:?}"),
            Self::Value(value) => write!(f, "{value}"),
            Self::Label(label) => write!(f, "{}", label.name()),
            Self::Operator(op) => write!(f, "{op}"),
        }
    }
}

impl From<Value> for Token {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Operator> for Token {
    fn from(op: Operator) -> Self {
        Self::Operator(op)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Statement
// ─────────────────────────────────────────────────────────────────────

/// A parsed token stream plus its extracted operator list.
///
/// Before any separator is chained in, `tokens.len() == 2 * operators.len() + 1`
/// for a well-formed stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    tokens: Vec<Token>,
    operators: Vec<Operator>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a statement from an already split operator list and token stream.
    pub fn from_parts(operators: Vec<Operator>, tokens: Vec<Token>) -> Self {
        Self { tokens, operators }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Append a token; operators are mirrored into the operator list.
    pub fn push(&mut self, token: Token) {
        if let Token::Operator(op) = &token {
            self.operators.push(*op);
        }
        self.tokens.push(token);
    }

    pub fn push_value(&mut self, value: Value) {
        self.tokens.push(Token::Value(value));
    }

    pub fn push_operator(&mut self, op: Operator) {
        self.push(Token::Operator(op));
    }

    /// Move every token and operator of `other` onto the end of this statement.
    pub fn append(&mut self, other: Statement) {
        self.tokens.extend(other.tokens);
        self.operators.extend(other.operators);
    }

    /// The most recently pushed token, for in-place postfix rewrites.
    pub fn last_mut(&mut self) -> Option<&mut Token> {
        self.tokens.last_mut()
    }

    /// Append a separator so another statement can follow in the same stream.
    ///
    /// Fails if nothing was parsed yet, if the stream is not a complete
    /// statement, or if it already ends with a separator.
    pub fn chain(&mut self) -> VisResult<()> {
        if self.tokens.is_empty() {
            return Err(VisError::new(
                ErrorCode::CHAIN_EMPTY,
                "can not chain before anything was parsed",
            ));
        }
        let ends_in_separator = self.tokens.last().is_some_and(Token::is_separator)
            || self.operators.last() == Some(&Operator::Separator);
        if ends_in_separator {
            return Err(VisError::new(
                ErrorCode::CHAIN_AFTER_SEPARATOR,
                "can not chain again before another statement was parsed",
            ));
        }
        // Separators add one token and one operator, so this holds across chains.
        if self.tokens.len() != 2 * self.operators.len() + 1 {
            return Err(VisError::new(
                ErrorCode::CHAIN_SIZE_MISMATCH,
                format!(
                    "{} tokens do not fit {} operators, expected {}",
                    self.tokens.len(),
                    self.operators.len(),
                    2 * self.operators.len() + 1
                ),
            ));
        }
        self.push_operator(Operator::Separator);
        Ok(())
    }

    pub fn into_parts(self) -> (Vec<Operator>, Vec<Token>) {
        (self.operators, self.tokens)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

//! The operator catalog.
//!
//! Every operator is a stateless unit variant carrying a fixed priority.
//! Declaration operators do not produce a value: they evaluate to a
//! [`Mutation`] that the evaluator applies to the target namespace.

use std::fmt;

use crate::{ErrorCode, Token, Unresolved, Value, VisError, VisResult};

/// A binary operator (or the separator pseudo-operator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // ── Structure ──
    /// `,` or `;`: splits a stream into independent sub-statements.
    Separator,

    // ── Declarations ──
    /// `=`
    Declare,
    /// `+=`
    AddTo,
    /// `-=`
    SubTo,
    /// `*=`
    MulTo,
    /// `/=`
    DivTo,

    // ── Comparisons ──
    /// `==`
    IsEquals,
    /// `!=`
    NotEquals,

    // ── Arithmetic ──
    /// `+` (also a sign)
    Add,
    /// `-` (also a sign)
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `^`
    Pow,
}

impl Operator {
    /// Reduction order: higher priorities are reduced first.
    pub fn priority(self) -> i32 {
        match self {
            Self::Separator => -10,
            Self::Declare | Self::AddTo | Self::SubTo | Self::MulTo | Self::DivTo => 10,
            Self::IsEquals | Self::NotEquals => 15,
            Self::Add | Self::Sub => 20,
            Self::Mul | Self::Div => 30,
            Self::Mod => 40,
            Self::Pow => 60,
        }
    }

    /// A sign may stand without a left value; zero is used instead.
    pub fn is_sign(self) -> bool {
        matches!(self, Self::Add | Self::Sub)
    }

    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            Self::Declare | Self::AddTo | Self::SubTo | Self::MulTo | Self::DivTo
        )
    }

    /// The arithmetic a compound assignment performs.
    pub fn compound_base(self) -> Option<Operator> {
        match self {
            Self::AddTo => Some(Self::Add),
            Self::SubTo => Some(Self::Sub),
            Self::MulTo => Some(Self::Mul),
            Self::DivTo => Some(Self::Div),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Separator => ",",
            Self::Declare => "=",
            Self::AddTo => "+=",
            Self::SubTo => "-=",
            Self::MulTo => "*=",
            Self::DivTo => "/=",
            Self::IsEquals => "==",
            Self::NotEquals => "!=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
        }
    }

    /// Combine two resolved values. Only value-producing operators qualify.
    pub fn apply(self, left: &Value, right: &Value) -> VisResult<Value> {
        let value = match self {
            Self::IsEquals => Value::Bool(left == right),
            Self::NotEquals => Value::Bool(left != right),
            Self::Add => Value::Number(left.as_number()? + right.as_number()?),
            Self::Sub => Value::Number(left.as_number()? - right.as_number()?),
            Self::Mul => Value::Number(left.as_number()? * right.as_number()?),
            Self::Div => Value::Number(left.as_number()? / right.as_number()?),
            Self::Mod => Value::Number(left.as_number()? % right.as_number()?),
            Self::Pow => Value::Number(left.as_number()?.powf(right.as_number()?)),
            Self::Separator
            | Self::Declare
            | Self::AddTo
            | Self::SubTo
            | Self::MulTo
            | Self::DivTo => {
                return Err(VisError::new(
                    ErrorCode::MALFORMED_STATEMENT,
                    format!("operator '{self}' does not produce a value"),
                ))
            }
        };
        Ok(value)
    }

    /// Evaluate the operator against its two neighbouring tokens.
    pub fn evaluate(self, left: &Token, right: &Token) -> VisResult<Outcome> {
        for side in [left, right] {
            if let Token::Operator(other) = side {
                return Err(VisError::new(
                    ErrorCode::OPERAND_IS_OPERATOR,
                    format!("operator '{self}' requires values on both sides, got '{other}'"),
                ));
            }
        }
        if !self.is_declaration() {
            return Ok(Outcome::Value(self.apply(&left.resolved()?, &right.resolved()?)?));
        }
        let Token::Label(target) = left else {
            return Err(VisError::new(
                ErrorCode::NOT_A_LABEL,
                format!("left side of '{self}' must be a name"),
            ));
        };
        Ok(Outcome::Mutation(Mutation {
            target: target.clone(),
            operator: self,
            value: right.resolved()?,
        }))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────

/// What evaluating an operator produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(Value),
    /// Deferred namespace change from a declaration operator.
    Mutation(Mutation),
}

/// A pending assignment or compound assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub target: Unresolved,
    pub operator: Operator,
    pub value: Value,
}

impl Mutation {
    /// Write into the target's namespace and return the stored value.
    pub fn apply(&self) -> VisResult<Value> {
        let scope = self.target.scope();
        let name = self.target.name();
        match self.operator.compound_base() {
            Some(base) => scope.change_by(name, self.value.clone(), base),
            None => {
                scope.declare(name, self.value.clone())?;
                Ok(self.value.clone())
            }
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Error kind, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Malformed input: unknown characters, unbalanced brackets, bad numbers.
    Parsing,
    /// Well-formed tokens that cannot be reduced.
    Evaluation,
    /// Resolution and type failures.
    Access,
}

impl ErrorKind {
    /// The code range reserved for this kind.
    pub fn range(self) -> RangeInclusive<u16> {
        match self {
            Self::Parsing => 100..=199,
            Self::Evaluation => 200..=299,
            Self::Access => 300..=399,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsing => write!(f, "ParsingError"),
            Self::Evaluation => write!(f, "EvaluationError"),
            Self::Access => write!(f, "AccessError"),
        }
    }
}

/// Numeric error code (100–399).
///
/// The field is private: codes are either one of the named constants or
/// pass through [`ErrorCode::checked`], so the kind derived from a code
/// always matches its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct ErrorCode(u16);

impl ErrorCode {
    // ── Parsing errors (100–199) ──
    pub const NEGATIVE_START: Self = Self(100);
    pub const UNEXPECTED_CHAR: Self = Self(110);
    pub const CHAIN_EMPTY: Self = Self(120);
    pub const CHAIN_SIZE_MISMATCH: Self = Self(130);
    pub const CHAIN_AFTER_SEPARATOR: Self = Self(140);
    pub const FACTORIAL_WITHOUT_VALUE: Self = Self(150);
    pub const FACTORIAL_DOMAIN: Self = Self(151);
    pub const BLOCK_WITHOUT_INTRODUCER: Self = Self(160);
    pub const BRACKETS_NOT_SINGLE: Self = Self(170);
    pub const NOT_CALLABLE: Self = Self(180);
    pub const NUMBER_TWO_DOTS: Self = Self(190);
    pub const NUMBER_WITHOUT_DIGITS: Self = Self(191);
    pub const BRACKET_NOT_CLOSED: Self = Self(192);
    pub const STRING_NOT_CLOSED: Self = Self(193);
    pub const UNEXPECTED_CLOSING: Self = Self(194);
    pub const NESTING_TOO_DEEP: Self = Self(195);
    pub const BRACKET_MISMATCH: Self = Self(197);

    // ── Evaluation errors (200–299) ──
    pub const OPERATOR_MISSING: Self = Self(200);
    pub const NOT_A_SIGN: Self = Self(210);
    pub const MALFORMED_STATEMENT: Self = Self(220);
    pub const MISSING_RIGHT_VALUE: Self = Self(230);
    pub const OPERAND_IS_OPERATOR: Self = Self(240);
    pub const WRONG_ARG_COUNT: Self = Self(250);

    // ── Access errors (300–399) ──
    pub const FIELD_MISSING: Self = Self(310);
    pub const NOT_A_NAMESPACE: Self = Self(328);
    pub const TYPE_MISMATCH: Self = Self(350);
    pub const INDEX_OUT_OF_RANGE: Self = Self(360);
    pub const NOT_A_LABEL: Self = Self(370);
    pub const NO_VALUE: Self = Self(380);
    pub const UNKNOWN_LIBRARY: Self = Self(390);
    pub const UNDECLARED_CHANGE: Self = Self(399);

    /// Build a code for `kind`, or `None` if `code` lies outside the kind's range.
    pub fn checked(kind: ErrorKind, code: u16) -> Option<Self> {
        kind.range().contains(&code).then_some(Self(code))
    }

    /// The raw numeric value.
    pub fn value(self) -> u16 {
        self.0
    }

    /// Get the kind for this error code.
    pub fn kind(self) -> ErrorKind {
        match self.0 {
            100..=199 => ErrorKind::Parsing,
            200..=299 => ErrorKind::Evaluation,
            _ => ErrorKind::Access,
        }
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        if (100..=399).contains(&code) {
            Ok(Self(code))
        } else {
            Err(format!("error code {code} is outside 100..=399"))
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A structured interpreter error.
///
/// The kind is always derived from the code, never passed separately.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} [{code}]: {message}")]
pub struct VisError {
    /// Error kind (derived from code).
    pub kind: ErrorKind,
    /// Error code (e.g., 380).
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
}

impl VisError {
    /// Create a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: code.kind(),
            code,
            message: message.into(),
        }
    }

    /// Shorthand for the common "wrong value type" access error.
    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        Self::new(
            ErrorCode::TYPE_MISMATCH,
            format!("expected {expected}, got {found}"),
        )
    }
}

//! Shared types for the Vision interpreter.
//!
//! This crate defines the value model, tokens, the operator catalog,
//! statements, namespaces and the error type used by every stage.

mod error;
mod namespace;
mod operator;
mod token;
mod value;

pub use error::{ErrorCode, ErrorKind, VisError};
pub use namespace::{Namespace, Unresolved};
pub use operator::{Mutation, Operator, Outcome};
pub use token::{Statement, Token};
pub use value::{CallKind, Callable, NativeFn, Range, RangeIter, Value};

/// Result type used throughout the interpreter.
pub type VisResult<T> = std::result::Result<T, VisError>;

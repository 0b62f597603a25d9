//! Vision evaluator.
//!
//! Reduces tokenized statements by operator priority and provides the
//! built-in library every execution context starts from.

mod evaluator;
mod library;
pub mod math;

pub use evaluator::evaluate;
pub use library::Library;

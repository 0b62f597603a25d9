//! Vision tokenizer.
//!
//! Converts source text into a [`vis_types::Statement`]. Brackets, arrays,
//! function calls and introducer blocks are scanned recursively and
//! evaluated on the spot, so the resulting statement is flat.

mod scanner;
mod tokenizer;

pub use tokenizer::{tokenize, Tokenizer, DEFAULT_MAX_DEPTH};

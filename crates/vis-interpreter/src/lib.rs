//! Vision drivers.
//!
//! [`Repl`] runs an interactive session, [`FileInterpreter`] runs a script
//! line by line. Both tokenize and evaluate every line against one
//! persistent namespace.

mod file;
mod options;
mod repl;

pub use file::{FileError, FileInterpreter, FileReport, LineFailure};
pub use options::{ErrorFormat, ErrorPolicy, InterpreterOptions};
pub use repl::Repl;

use vis_parser::Tokenizer;
use vis_types::{Namespace, Value, VisResult};

/// Tokenize and evaluate one line with default options.
pub fn interpret(namespace: &Namespace, line: &str) -> VisResult<Vec<Value>> {
    interpret_with(namespace, line, &InterpreterOptions::default())
}

/// Tokenize and evaluate one line.
pub fn interpret_with(
    namespace: &Namespace,
    line: &str,
    options: &InterpreterOptions,
) -> VisResult<Vec<Value>> {
    let mut tokenizer = Tokenizer::new(namespace).with_max_depth(options.max_depth);
    tokenizer.tokenize(line)?;
    vis_eval::evaluate(tokenizer.statement())
}

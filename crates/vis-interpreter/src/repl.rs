//! Interactive read-evaluate-print session.

use std::io::{self, BufRead, Write};

use tracing::debug;
use vis_eval::Library;
use vis_types::{Namespace, Value};

use crate::{interpret_with, InterpreterOptions};

/// Reads lines from `R`, writes prompts, results and errors to `W`.
///
/// All lines share one namespace. Errors are printed and the session goes on.
pub struct Repl<R, W> {
    input: R,
    output: W,
    namespace: Namespace,
    options: InterpreterOptions,
    closed: bool,
}

impl<R: BufRead, W: Write> Repl<R, W> {
    /// A session over a fresh library scope; `print` goes to stdout.
    pub fn new(input: R, output: W) -> Self {
        Self::with_namespace(input, output, Library::new().scope())
    }

    pub fn with_namespace(input: R, output: W, namespace: Namespace) -> Self {
        Self {
            input,
            output,
            namespace,
            options: InterpreterOptions::default(),
            closed: false,
        }
    }

    pub fn with_options(mut self, options: InterpreterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Prompt, read and interpret one line.
    ///
    /// Returns `false` once the input is exhausted or the exit command was read.
    pub fn interpret_next(&mut self) -> io::Result<bool> {
        if self.closed {
            return Ok(false);
        }
        write!(self.output, "{}", self.options.prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            debug!("input exhausted");
            self.closed = true;
            return Ok(false);
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim() == self.options.exit_command {
            self.closed = true;
            return Ok(false);
        }

        match interpret_with(&self.namespace, line, &self.options) {
            Ok(values) => self.print_results(&values)?,
            Err(err) => {
                let rendered = self.options.error_format.render(&err);
                writeln!(self.output, "{rendered}")?;
            }
        }
        Ok(true)
    }

    /// Run until the input ends or the exit command is read.
    pub fn interpret_all(&mut self) -> io::Result<()> {
        while self.interpret_next()? {}
        Ok(())
    }

    fn print_results(&mut self, values: &[Value]) -> io::Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let shown: Vec<String> = values.iter().map(ToString::to_string).collect();
        writeln!(self.output, "{}", shown.join("; "))
    }

    /// Give back the output sink.
    pub fn into_output(self) -> W {
        self.output
    }
}

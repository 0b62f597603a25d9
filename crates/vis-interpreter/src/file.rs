//! Line-oriented script interpreter.
//!
//! Every line of a script is tokenized and evaluated against one persistent
//! namespace. What happens after a failing line is up to the
//! [`ErrorPolicy`](crate::ErrorPolicy).

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use vis_eval::Library;
use vis_types::{Namespace, Value, VisError};

use crate::{interpret_with, ErrorPolicy, InterpreterOptions};

/// Failure of the file driver.
#[derive(Debug, Error)]
pub enum FileError {
    /// A line failed to tokenize or evaluate (1-based line number).
    #[error("error in line {line}: {source}")]
    Line { line: usize, source: VisError },
    /// `interpret_next` was called after the last line.
    #[error("no line left after line {line}")]
    Exhausted { line: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A failed line recorded under [`ErrorPolicy::Continue`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineFailure {
    pub line: usize,
    pub error: VisError,
}

/// Outcome of [`FileInterpreter::interpret_all`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileReport {
    /// Lines read, blank ones included.
    pub lines: usize,
    pub failures: Vec<LineFailure>,
}

impl FileReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct FileInterpreter<R> {
    reader: R,
    namespace: Namespace,
    options: InterpreterOptions,
    /// Number of lines consumed so far.
    line: usize,
}

impl FileInterpreter<BufReader<File>> {
    /// Open a script; its absolute path is bound as `__file__`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let namespace = Library::new().file_scope(path).scope();
        debug!(path = %path.display(), "opened script");
        Ok(Self::from_reader(BufReader::new(file), namespace))
    }
}

impl<R: BufRead> FileInterpreter<R> {
    pub fn from_reader(reader: R, namespace: Namespace) -> Self {
        Self {
            reader,
            namespace,
            options: InterpreterOptions::default(),
            line: 0,
        }
    }

    pub fn with_options(mut self, options: InterpreterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Number of lines consumed so far.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Interpret the next line and return its values.
    pub fn interpret_next(&mut self) -> Result<Vec<Value>, FileError> {
        match self.read_line()? {
            Some(text) => self.run(&text),
            None => Err(FileError::Exhausted { line: self.line }),
        }
    }

    /// Interpret every remaining line.
    ///
    /// Under [`ErrorPolicy::Abort`] the first failing line is returned as
    /// [`FileError::Line`]; under [`ErrorPolicy::Continue`] failures are
    /// collected in the report.
    pub fn interpret_all(&mut self) -> Result<FileReport, FileError> {
        let keep_going = self.options.error_policy == ErrorPolicy::Continue;
        let mut report = FileReport::default();
        while let Some(text) = self.read_line()? {
            report.lines += 1;
            match self.run(&text) {
                Ok(_) => {}
                Err(FileError::Line { line, source }) if keep_going => {
                    warn!(line, error = %source, "line failed");
                    report.failures.push(LineFailure {
                        line,
                        error: source,
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(report)
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut text = String::new();
        if self.reader.read_line(&mut text)? == 0 {
            return Ok(None);
        }
        self.line += 1;
        let len = text.trim_end_matches(['\n', '\r']).len();
        text.truncate(len);
        Ok(Some(text))
    }

    fn run(&self, text: &str) -> Result<Vec<Value>, FileError> {
        debug!(line = self.line, "interpret line");
        interpret_with(&self.namespace, text, &self.options).map_err(|source| FileError::Line {
            line: self.line,
            source,
        })
    }
}

//! Public tokenizer API.

use tracing::debug;
use vis_types::{ErrorCode, Namespace, Statement, VisError, VisResult};

use crate::scanner::Scanner;

/// Default bound on bracket, array, call and block nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Turns source text into a [`Statement`], resolving names against a namespace.
///
/// Successive calls to [`Tokenizer::tokenize`] append to the same statement;
/// use [`Tokenizer::chain`] in between to keep them as separate values.
pub struct Tokenizer {
    namespace: Namespace,
    max_depth: usize,
    statement: Statement,
}

impl Tokenizer {
    pub fn new(namespace: &Namespace) -> Self {
        Self {
            namespace: namespace.clone(),
            max_depth: DEFAULT_MAX_DEPTH,
            statement: Statement::new(),
        }
    }

    /// Limit how deep sub-expressions may nest.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Tokenize all of `source`.
    pub fn tokenize(&mut self, source: &str) -> VisResult<()> {
        self.tokenize_at(source, 0)
    }

    /// Tokenize `source` from the character index `start` on.
    pub fn tokenize_at(&mut self, source: &str, start: isize) -> VisResult<()> {
        let Ok(start) = usize::try_from(start) else {
            return Err(VisError::new(
                ErrorCode::NEGATIVE_START,
                format!("start index {start} must not be negative"),
            ));
        };
        let chars: Vec<char> = source.chars().collect();
        let start = start.min(chars.len());
        let (statement, _) = Scanner::new(&chars, start, &self.namespace, self.max_depth).scan()?;
        debug!(
            tokens = statement.tokens().len(),
            operators = statement.operators().len(),
            "tokenized"
        );
        self.statement.append(statement);
        Ok(())
    }

    /// Separate what was tokenized so far from what comes next.
    pub fn chain(&mut self) -> VisResult<()> {
        self.statement.chain()
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn into_statement(self) -> Statement {
        self.statement
    }
}

/// Tokenize `source` against `namespace` with default settings.
pub fn tokenize(source: &str, namespace: &Namespace) -> VisResult<Statement> {
    let mut tokenizer = Tokenizer::new(namespace);
    tokenizer.tokenize(source)?;
    Ok(tokenizer.into_statement())
}

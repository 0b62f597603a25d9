//! Driver configuration.

use serde::{Deserialize, Serialize};
use vis_parser::DEFAULT_MAX_DEPTH;
use vis_types::VisError;

/// What the file driver does when a line fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop at the first failing line.
    #[default]
    Abort,
    /// Record the failure and go on with the next line.
    Continue,
}

/// How drivers print errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorFormat {
    /// `ParsingError [110]: could not parse char '#' at 3`
    #[default]
    Text,
    /// One JSON object per error.
    Json,
}

impl ErrorFormat {
    pub fn render(self, error: &VisError) -> String {
        match self {
            Self::Text => error.to_string(),
            Self::Json => serde_json::to_string(error).unwrap_or_else(|_| error.to_string()),
        }
    }
}

/// Settings shared by the interactive and the file driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterOptions {
    pub error_policy: ErrorPolicy,
    pub error_format: ErrorFormat,
    /// Deepest allowed nesting of brackets, arrays, calls and blocks.
    pub max_depth: usize,
    pub prompt: String,
    /// A line equal to this ends an interactive session.
    pub exit_command: String,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::Abort,
            error_format: ErrorFormat::Text,
            max_depth: DEFAULT_MAX_DEPTH,
            prompt: ">>> ".to_string(),
            exit_command: "exit".to_string(),
        }
    }
}

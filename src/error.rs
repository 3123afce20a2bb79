//! Extraction error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an extraction call.
///
/// Problems local to a single definition (undecodable docstrings, unknown
/// annotations, non-literal defaults) are recovered and never show up here.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Source text does not parse as Python.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// Source file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The Python grammar could not be loaded into the parser.
    #[error("failed to load Python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
}

impl ExtractError {
    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;

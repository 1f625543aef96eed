//! Error types for arda-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in arda-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data record whose column count does not match the header (strict policy only)
    #[error("malformed row at line {line}: expected {expected} columns, found {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Mapping logic failed to compile
    #[error("syntax error in mapping logic at {line}:{column}: {message}")]
    LogicSyntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// Mapping logic failed while converting a row
    #[error("mapping logic failed on input line {line}: {message}")]
    LogicRuntime { line: usize, message: String },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

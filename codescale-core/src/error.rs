//! Error types for the scoring engine.
//!
//! Evaluation itself never fails: parse problems travel as [`ParseFailure`]
//! values and configuration problems are recovered by falling back to the
//! built-in weights.  [`ConfigError`] is only surfaced by the explicit
//! loader in [`crate::config`].

use std::path::PathBuf;

use thiserror::Error;

/// The source could not be parsed into a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at line {line}, column {column}: {message}")]
pub struct ParseFailure {
    pub message: String,
    /// 1-based line of the first erroneous node.
    pub line: usize,
    /// 1-based column of the first erroneous node.
    pub column: usize,
}

impl ParseFailure {
    /// A failure that is not tied to a source position.
    pub fn unpositioned(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: 0,
            column: 0,
        }
    }
}

/// Loading or validating a weight configuration failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid metric weights: {0}")]
    InvalidWeights(String),
}

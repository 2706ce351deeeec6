use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("unknown compile mode: {0}")]
    UnknownCompileMode(String),

    #[error("invalid gitoid URI: {0}")]
    InvalidUri(String),
}

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A dependency was added with an empty path. This is a caller bug.
    #[error("dependency path must not be empty")]
    EmptyPath,

    /// A second module target was added; a build step has at most one.
    #[error("module target already set to {existing}")]
    ModuleTargetAlreadySet { existing: String },

    /// Snapshot bytes do not have the expected shape.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

use std::path::PathBuf;

use mkbom_types::{Gitoid, HashAlgorithm, TypeError};

/// Errors from BOM, object store, and metadata operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(Gitoid),

    /// Stored bytes do not hash to the name they are filed under.
    #[error("hash mismatch for {id}: computed {computed}")]
    HashMismatch { id: Gitoid, computed: String },

    /// A directory level could not be opened or created. Every handle
    /// acquired by the failing call has been released.
    #[error("cannot open or create directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A leaf file could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An object name is not a usable hex gitoid.
    #[error("invalid object name: {0:?}")]
    InvalidName(String),

    /// A document mixes gitoids of different algorithms.
    #[error("algorithm mismatch: document is {expected}, entry is {actual}")]
    AlgorithmMismatch {
        expected: HashAlgorithm,
        actual: HashAlgorithm,
    },

    /// Text that should be a BOM document is not one.
    #[error("malformed BOM document: {0}")]
    MalformedDocument(String),

    /// Bytes that should be an OmniBOR note are not one.
    #[error("malformed OmniBOR note: {0}")]
    MalformedNote(String),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

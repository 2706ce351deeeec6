use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::gitoid::Gitoid;

/// A dependency file bound to the gitoid of its contents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Path as recorded in the dependency ledger.
    pub path: PathBuf,
    /// Gitoid of the file's raw bytes.
    pub gitoid: Gitoid,
}

impl DependencyRecord {
    /// Create a new record.
    pub fn new(path: impl Into<PathBuf>, gitoid: Gitoid) -> Self {
        Self {
            path: path.into(),
            gitoid,
        }
    }
}

use std::path::PathBuf;

use mkbom_store::OmniborNote;
use mkbom_types::{Gitoid, HashAlgorithm};
use serde::Serialize;

/// What one algorithm's pass over a build step produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlgorithmReport {
    pub algorithm: HashAlgorithm,
    /// Gitoid of the stored BOM document.
    pub document: Option<Gitoid>,
    /// Where the document was written.
    pub object_path: Option<PathBuf>,
    /// Where the metadata was written; `None` when the step has no output.
    pub metadata_path: Option<PathBuf>,
    /// Number of dependencies in the document.
    pub entries: usize,
    /// Dependencies left out because they could not be read.
    pub skipped: Vec<PathBuf>,
    /// Why no provenance was recorded, if it was not.
    pub error: Option<String>,
}

impl AlgorithmReport {
    pub(crate) fn failed(algorithm: HashAlgorithm, error: String) -> Self {
        Self {
            algorithm,
            document: None,
            object_path: None,
            metadata_path: None,
            entries: 0,
            skipped: Vec::new(),
            error: Some(error),
        }
    }

    /// Returns `true` if the document was stored.
    pub fn is_recorded(&self) -> bool {
        self.document.is_some()
    }
}

/// Outcome of finishing a session, one entry per configured algorithm.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub algorithms: Vec<AlgorithmReport>,
}

impl SessionReport {
    /// Returns `true` if every configured algorithm recorded its document.
    pub fn is_complete(&self) -> bool {
        self.algorithms.iter().all(AlgorithmReport::is_recorded)
    }

    /// The report for `algorithm`, if it was configured.
    pub fn get(&self, algorithm: HashAlgorithm) -> Option<&AlgorithmReport> {
        self.algorithms.iter().find(|r| r.algorithm == algorithm)
    }

    /// `.note.omnibor` section contents naming every stored document.
    pub fn omnibor_note(&self) -> Vec<u8> {
        OmniborNote::encode_section(self.algorithms.iter().filter_map(|r| r.document.as_ref()))
    }
}

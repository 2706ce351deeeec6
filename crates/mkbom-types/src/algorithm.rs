use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Hash function used to compute gitoids.
///
/// The algorithm is a build-wide setting: a single BOM document never mixes
/// gitoids of different algorithms, and the object store keeps each algorithm
/// in its own shard namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1, 20-byte digests (40 hex characters).
    Sha1,
    /// SHA-256, 32-byte digests (64 hex characters).
    Sha256,
}

impl HashAlgorithm {
    /// Every supported algorithm, in note-type order.
    pub const ALL: [HashAlgorithm; 2] = [HashAlgorithm::Sha1, HashAlgorithm::Sha256];

    /// Digest length in bytes.
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }

    /// Digest length in hex characters.
    pub const fn hex_len(&self) -> usize {
        self.digest_len() * 2
    }

    /// Short lowercase name (`sha1`, `sha256`).
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    /// Directory name under `objects/` and `metadata/gnu/`.
    pub const fn shard_namespace(&self) -> &'static str {
        match self {
            Self::Sha1 => "gitoid_blob_sha1",
            Self::Sha256 => "gitoid_blob_sha256",
        }
    }

    /// First line of a BOM document, newline included.
    pub const fn document_header(&self) -> &'static str {
        match self {
            Self::Sha1 => "gitoid:blob:sha1\n",
            Self::Sha256 => "gitoid:blob:sha256\n",
        }
    }

    /// ELF note type used in the `.note.omnibor` section.
    pub const fn note_type(&self) -> u32 {
        match self {
            Self::Sha1 => 1,
            Self::Sha256 => 2,
        }
    }

    /// Recover the algorithm from a shard namespace directory name.
    pub fn from_shard_namespace(namespace: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.shard_namespace() == namespace)
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            _ => Err(TypeError::UnknownAlgorithm(s.to_string())),
        }
    }
}

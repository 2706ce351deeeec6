use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use mkbom_types::{Gitoid, HashAlgorithm};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::trace;

/// Git blob hasher.
///
/// Every computation hashes the Git object header `"blob <len>\0"` ahead of
/// the content, so results are interchangeable with Git blob object IDs of
/// the same object format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GitoidHasher {
    algorithm: HashAlgorithm,
}

impl GitoidHasher {
    /// SHA-1 gitoids (Git's default object format).
    pub const SHA1: Self = Self {
        algorithm: HashAlgorithm::Sha1,
    };
    /// SHA-256 gitoids.
    pub const SHA256: Self = Self {
        algorithm: HashAlgorithm::Sha256,
    };

    /// Create a hasher for the given algorithm.
    pub const fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The algorithm used by this hasher.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash raw bytes.
    pub fn hash(&self, data: &[u8]) -> Gitoid {
        let digest = match self.algorithm {
            HashAlgorithm::Sha1 => blob_digest::<Sha1>(data),
            HashAlgorithm::Sha256 => blob_digest::<Sha256>(data),
        };
        Gitoid::from_digest(self.algorithm, &digest)
            .expect("digest length is fixed by the algorithm")
    }

    /// Hash the contents of a file.
    ///
    /// The file is read in full before hashing so the length in the blob
    /// header always matches the bytes that were hashed.
    pub fn hash_file(&self, path: &Path) -> io::Result<Gitoid> {
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        let id = self.hash(&data);
        trace!(path = %path.display(), len = data.len(), gitoid = %id, "hashed file");
        Ok(id)
    }

    /// Verify that data produces the expected gitoid.
    ///
    /// A gitoid of a different algorithm never verifies.
    pub fn verify(&self, data: &[u8], expected: &Gitoid) -> bool {
        expected.algorithm() == self.algorithm && self.hash(data) == *expected
    }

    /// Hash a hex gitoid string against data, returning a typed error on mismatch.
    pub fn check(&self, data: &[u8], expected_hex: &str) -> Result<Gitoid, HasherError> {
        let computed = self.hash(data);
        if computed.to_hex() != expected_hex {
            return Err(HasherError::Mismatch {
                expected: expected_hex.to_string(),
                computed: computed.to_hex(),
            });
        }
        Ok(computed)
    }
}

impl Default for GitoidHasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

/// Digest `"blob " + decimal(len) + NUL + data` with `D`.
fn blob_digest<D: Digest>(data: &[u8]) -> Vec<u8> {
    let header = format!("blob {}\0", data.len());
    let mut hasher = D::new();
    hasher.update(header.as_bytes());
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("gitoid mismatch: expected {expected}, computed {computed}")]
    Mismatch { expected: String, computed: String },
}

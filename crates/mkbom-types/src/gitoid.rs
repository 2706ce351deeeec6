use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithm::HashAlgorithm;
use crate::error::TypeError;

/// Git-blob-compatible content identifier.
///
/// A `Gitoid` is the digest of `"blob " + decimal(len) + NUL + content` under
/// one [`HashAlgorithm`]. Identical content always produces the same gitoid
/// for a given algorithm; gitoids of different algorithms are unrelated.
///
/// Within one algorithm, the derived ordering (raw digest bytes) matches the
/// lexicographic ordering of the lowercase hex strings.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Gitoid {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

impl Gitoid {
    /// URI scheme prefix shared by every gitoid URI.
    pub const URI_PREFIX: &'static str = "gitoid:blob:";

    /// Wrap a finished digest.
    pub fn from_digest(algorithm: HashAlgorithm, digest: &[u8]) -> Result<Self, TypeError> {
        if digest.len() != algorithm.digest_len() {
            return Err(TypeError::InvalidLength {
                expected: algorithm.digest_len(),
                actual: digest.len(),
            });
        }
        Ok(Self {
            algorithm,
            digest: digest.to_vec(),
        })
    }

    /// Parse from a hex string of the algorithm's length.
    pub fn from_hex(algorithm: HashAlgorithm, s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_digest(algorithm, &bytes)
    }

    /// Parse from a bare hex string, inferring the algorithm from its length.
    pub fn parse_hex(s: &str) -> Result<Self, TypeError> {
        let algorithm = HashAlgorithm::ALL
            .into_iter()
            .find(|alg| alg.hex_len() == s.len())
            .ok_or(TypeError::InvalidLength {
                expected: HashAlgorithm::Sha1.hex_len(),
                actual: s.len(),
            })?;
        Self::from_hex(algorithm, s)
    }

    /// Parse an OmniBOR URI of the form `gitoid:blob:<alg>:<hex>`.
    pub fn from_uri(uri: &str) -> Result<Self, TypeError> {
        let rest = uri
            .strip_prefix(Self::URI_PREFIX)
            .ok_or_else(|| TypeError::InvalidUri(uri.to_string()))?;
        let (alg, hex) = rest
            .split_once(':')
            .ok_or_else(|| TypeError::InvalidUri(uri.to_string()))?;
        Self::from_hex(alg.parse()?, hex)
    }

    /// The algorithm this gitoid was computed with.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.digest
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.digest)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.digest[..4])
    }

    /// OmniBOR URI: `gitoid:blob:sha1:<hex>`.
    pub fn to_uri(&self) -> String {
        format!("{}{}:{}", Self::URI_PREFIX, self.algorithm, self.to_hex())
    }

    /// Object-store shard: the first two hex characters.
    pub fn shard_prefix(&self) -> String {
        hex::encode(&self.digest[..1])
    }

    /// Object-store leaf name: every hex character after the shard.
    pub fn shard_suffix(&self) -> String {
        hex::encode(&self.digest[1..])
    }
}

impl fmt::Debug for Gitoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gitoid({}:{})", self.algorithm, self.short_hex())
    }
}

impl fmt::Display for Gitoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<Gitoid> for String {
    fn from(id: Gitoid) -> Self {
        id.to_uri()
    }
}

impl TryFrom<String> for Gitoid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_uri(&s)
    }
}

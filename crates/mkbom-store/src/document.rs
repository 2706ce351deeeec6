use std::path::{Path, PathBuf};

use mkbom_crypto::GitoidHasher;
use mkbom_types::{DependencyRecord, Gitoid, HashAlgorithm};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Prefix of every entry line in a BOM document.
const ENTRY_PREFIX: &str = "blob ";

/// A first-level OmniBOR document.
///
/// The text is a header naming the algorithm followed by one
/// `blob <gitoid>` line per dependency, sorted by gitoid. Sorting by gitoid
/// rather than path makes the text, and therefore the document's own
/// gitoid, independent of the order dependencies were discovered in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BomDocument {
    algorithm: HashAlgorithm,
    entries: Vec<Gitoid>,
    text: String,
    gitoid: Gitoid,
}

impl BomDocument {
    /// Build a document from dependency gitoids in any order.
    pub fn from_gitoids(algorithm: HashAlgorithm, mut entries: Vec<Gitoid>) -> StoreResult<Self> {
        if let Some(other) = entries.iter().find(|id| id.algorithm() != algorithm) {
            return Err(StoreError::AlgorithmMismatch {
                expected: algorithm,
                actual: other.algorithm(),
            });
        }
        entries.sort();

        let mut text = String::with_capacity(
            algorithm.document_header().len() + entries.len() * (ENTRY_PREFIX.len() + algorithm.hex_len() + 1),
        );
        text.push_str(algorithm.document_header());
        for id in &entries {
            text.push_str(ENTRY_PREFIX);
            text.push_str(&id.to_hex());
            text.push('\n');
        }

        let gitoid = GitoidHasher::new(algorithm).hash(text.as_bytes());
        Ok(Self {
            algorithm,
            entries,
            text,
            gitoid,
        })
    }

    /// Build a document from dependency records.
    pub fn from_records(algorithm: HashAlgorithm, records: &[DependencyRecord]) -> StoreResult<Self> {
        Self::from_gitoids(algorithm, records.iter().map(|r| r.gitoid.clone()).collect())
    }

    /// Parse document text read back from a store.
    ///
    /// The text must be exactly what [`from_gitoids`](Self::from_gitoids)
    /// would render: a known header, sorted entries, a trailing newline.
    pub fn parse(text: &str) -> StoreResult<Self> {
        let algorithm = HashAlgorithm::ALL
            .into_iter()
            .find(|alg| text.starts_with(alg.document_header()))
            .ok_or_else(|| StoreError::MalformedDocument("unknown header".into()))?;

        let body = &text[algorithm.document_header().len()..];
        if !body.is_empty() && !body.ends_with('\n') {
            return Err(StoreError::MalformedDocument("missing trailing newline".into()));
        }

        let entries = body
            .lines()
            .enumerate()
            .map(|(index, line)| -> StoreResult<Gitoid> {
                let hex = line.strip_prefix(ENTRY_PREFIX).ok_or_else(|| {
                    StoreError::MalformedDocument(format!("line {} is not a blob entry", index + 2))
                })?;
                Ok(Gitoid::from_hex(algorithm, hex)?)
            })
            .collect::<StoreResult<Vec<_>>>()?;

        if entries.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(StoreError::MalformedDocument("entries are not sorted".into()));
        }

        let document = Self::from_gitoids(algorithm, entries)?;
        if document.text != text {
            return Err(StoreError::MalformedDocument("text is not canonical".into()));
        }
        Ok(document)
    }

    /// Hash algorithm of the document and every entry.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Dependency gitoids in document order.
    pub fn entries(&self) -> &[Gitoid] {
        &self.entries
    }

    /// The exact text that was hashed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The document's own gitoid.
    pub fn gitoid(&self) -> &Gitoid {
        &self.gitoid
    }

    /// Number of dependency entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for a header-only document.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of hashing a dependency list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyScan {
    /// Hashed dependencies, stably sorted by gitoid.
    pub records: Vec<DependencyRecord>,
    /// Dependencies that could not be read, in discovery order.
    pub skipped: Vec<PathBuf>,
}

/// Hashes dependency files and assembles BOM documents.
#[derive(Clone, Copy, Debug)]
pub struct BomBuilder {
    hasher: GitoidHasher,
}

impl BomBuilder {
    /// Create a builder for the given algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            hasher: GitoidHasher::new(algorithm),
        }
    }

    /// The builder's algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.hasher.algorithm()
    }

    /// Hash every readable dependency.
    ///
    /// Files that cannot be opened or read are skipped, not fatal; they are
    /// listed in [`DependencyScan::skipped`] so callers can report them.
    pub fn scan<I, P>(&self, paths: I) -> DependencyScan
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut scan = DependencyScan::default();
        for path in paths {
            let path = path.as_ref();
            match self.hasher.hash_file(path) {
                Ok(gitoid) => scan.records.push(DependencyRecord::new(path, gitoid)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "dependency unreadable; left out of BOM");
                    scan.skipped.push(path.to_path_buf());
                }
            }
        }
        scan.records.sort_by(|a, b| a.gitoid.cmp(&b.gitoid));
        scan
    }

    /// Hash the dependencies and build their document.
    pub fn build<I, P>(&self, paths: I) -> StoreResult<(BomDocument, DependencyScan)>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let scan = self.scan(paths);
        let document = BomDocument::from_records(self.algorithm(), &scan.records)?;
        debug!(
            algorithm = %self.algorithm(),
            entries = document.len(),
            skipped = scan.skipped.len(),
            gitoid = %document.gitoid(),
            "BOM document built"
        );
        Ok((document, scan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const A_SHA1: &str = "2e65efe2a145dda7ee51d1741299f848e5bf752e";
    const B_SHA1: &str = "63d8dbd40c23542e740659a7168a0ce3138ea748";
    const AB_DOC_SHA1: &str = "5079f42d94056d1789d1a39c853748c58186e7ca";
    const A_SHA256: &str = "eb337bcee2061c5313c9a1392116b6c76039e9e30d71467ae359b36277e17dc7";
    const B_SHA256: &str = "a0bcd9a45d24c6a0e3748aa53f02e3a2c4cea32e0392feeb304a71a08a193e9b";
    const AB_DOC_SHA256: &str = "3d35c591ec5716d66adb6014d940feead88fb0c83642fe45527b49261dc40059";
    const EMPTY_DOC_SHA1: &str = "daa8845467f5d281d4d233a69af67b85dd50f9f0";

    fn fixture() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.h");
        let b = tmp.path().join("b.h");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();
        (tmp, a, b)
    }

    #[test]
    fn two_file_scenario_sha1() {
        let (_tmp, a, b) = fixture();
        let (doc, scan) = BomBuilder::new(HashAlgorithm::Sha1).build([&b, &a]).unwrap();
        assert_eq!(
            doc.text(),
            format!("gitoid:blob:sha1\nblob {A_SHA1}\nblob {B_SHA1}\n")
        );
        assert_eq!(doc.gitoid().to_hex(), AB_DOC_SHA1);
        assert_eq!(scan.records[0].path, a);
        assert!(scan.skipped.is_empty());
    }

    #[test]
    fn sorted_by_gitoid_not_path_sha256() {
        let (_tmp, a, b) = fixture();
        let (doc, scan) = BomBuilder::new(HashAlgorithm::Sha256).build([&a, &b]).unwrap();
        // b's gitoid sorts first even though a.h was discovered first.
        assert_eq!(
            doc.text(),
            format!("gitoid:blob:sha256\nblob {B_SHA256}\nblob {A_SHA256}\n")
        );
        assert_eq!(doc.gitoid().to_hex(), AB_DOC_SHA256);
        assert_eq!(scan.records[0].path, b);
    }

    #[test]
    fn discovery_order_does_not_matter() {
        let (_tmp, a, b) = fixture();
        let builder = BomBuilder::new(HashAlgorithm::Sha1);
        let (doc1, _) = builder.build([&a, &b]).unwrap();
        let (doc2, _) = builder.build([&b, &a]).unwrap();
        assert_eq!(doc1.text(), doc2.text());
        assert_eq!(doc1.gitoid(), doc2.gitoid());
    }

    #[test]
    fn empty_set_is_header_only() {
        let builder = BomBuilder::new(HashAlgorithm::Sha1);
        let (doc, _) = builder.build(Vec::<PathBuf>::new()).unwrap();
        assert_eq!(doc.text(), "gitoid:blob:sha1\n");
        assert!(doc.is_empty());
        assert_eq!(doc.gitoid().to_hex(), EMPTY_DOC_SHA1);
    }

    // A missing dependency must still show up in the skipped list.
    #[test]
    fn unreadable_dependency_is_skipped_and_reported() {
        let (tmp, a, b) = fixture();
        let missing = tmp.path().join("gone.h");
        let (doc, scan) = BomBuilder::new(HashAlgorithm::Sha1)
            .build([&a, &missing, &b])
            .unwrap();
        assert_eq!(doc.gitoid().to_hex(), AB_DOC_SHA1);
        assert_eq!(scan.skipped, vec![missing]);
        assert_eq!(scan.records.len(), 2);
    }

    #[test]
    fn duplicate_dependencies_are_kept() {
        let (_tmp, a, _b) = fixture();
        let (doc, _) = BomBuilder::new(HashAlgorithm::Sha1).build([&a, &a]).unwrap();
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn mixed_algorithms_rejected() {
        let sha1 = GitoidHasher::SHA1.hash(b"a");
        let sha256 = GitoidHasher::SHA256.hash(b"a");
        let err = BomDocument::from_gitoids(HashAlgorithm::Sha1, vec![sha1, sha256]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::AlgorithmMismatch {
                expected: HashAlgorithm::Sha1,
                actual: HashAlgorithm::Sha256
            }
        ));
    }

    #[test]
    fn parse_roundtrips_canonical_text() {
        let ids = vec![GitoidHasher::SHA1.hash(b"b"), GitoidHasher::SHA1.hash(b"a")];
        let doc = BomDocument::from_gitoids(HashAlgorithm::Sha1, ids).unwrap();
        let parsed = BomDocument::parse(doc.text()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn parse_rejects_bad_documents() {
        let unsorted = format!("gitoid:blob:sha1\nblob {B_SHA1}\nblob {A_SHA1}\n");
        let no_newline = format!("gitoid:blob:sha1\nblob {A_SHA1}");
        let wrong_len = format!("gitoid:blob:sha256\nblob {A_SHA1}\n");
        let bad_line = "gitoid:blob:sha1\ntree abc\n".to_string();
        for text in [
            "gitoid:blob:md5\n".to_string(),
            unsorted,
            no_newline,
            wrong_len,
            bad_line,
        ] {
            assert!(BomDocument::parse(&text).is_err(), "accepted {text:?}");
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_permutation_gives_same_document(
                contents in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..8),
                seed in any::<u64>(),
            ) {
                let hasher = GitoidHasher::SHA256;
                let ids: Vec<Gitoid> = contents.iter().map(|c| hasher.hash(c)).collect();
                let mut shuffled = ids.clone();
                if !shuffled.is_empty() {
                    let k = (seed as usize) % shuffled.len();
                    shuffled.rotate_left(k);
                }
                if seed % 2 == 0 {
                    shuffled.reverse();
                }
                let d1 = BomDocument::from_gitoids(HashAlgorithm::Sha256, ids).unwrap();
                let d2 = BomDocument::from_gitoids(HashAlgorithm::Sha256, shuffled).unwrap();
                prop_assert_eq!(d1.text(), d2.text());
                prop_assert_eq!(d1.gitoid(), d2.gitoid());
            }
        }
    }
}

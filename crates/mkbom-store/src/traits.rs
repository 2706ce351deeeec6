use std::path::PathBuf;

use mkbom_crypto::GitoidHasher;
use mkbom_types::Gitoid;

use crate::document::BomDocument;
use crate::error::{StoreError, StoreResult};

/// Content-addressed store of BOM documents.
///
/// All implementations must satisfy these invariants:
/// - An entry is filed under the gitoid of its exact bytes, so the same
///   document always lands under the same name.
/// - Writing an existing entry again is harmless: same name, same bytes.
/// - The store never interprets the bytes it holds; [`verify`](Self::verify)
///   does that on top of [`read`](Self::read).
pub trait ObjectStore: Send + Sync {
    /// Store a document and return its gitoid.
    fn write(&self, document: &BomDocument) -> StoreResult<Gitoid>;

    /// Read the raw bytes filed under `id`.
    ///
    /// Returns `Ok(None)` if there is no such entry.
    fn read(&self, id: &Gitoid) -> StoreResult<Option<Vec<u8>>>;

    /// Check whether an entry exists.
    fn exists(&self, id: &Gitoid) -> StoreResult<bool>;

    /// Filesystem location of the entry for `id`, if the store has one.
    fn location(&self, _id: &Gitoid) -> Option<PathBuf> {
        None
    }

    /// Read an entry, re-hash it, and parse it back into a document.
    fn verify(&self, id: &Gitoid) -> StoreResult<BomDocument> {
        let bytes = self.read(id)?.ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let computed = GitoidHasher::new(id.algorithm()).hash(&bytes);
        if &computed != id {
            return Err(StoreError::HashMismatch {
                id: id.clone(),
                computed: computed.to_hex(),
            });
        }

        let text = std::str::from_utf8(&bytes)
            .map_err(|e| StoreError::MalformedDocument(format!("not UTF-8: {e}")))?;
        BomDocument::parse(text)
    }
}

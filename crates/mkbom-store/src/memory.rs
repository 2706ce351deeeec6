use std::collections::HashMap;
use std::sync::RwLock;

use mkbom_types::Gitoid;

use crate::document::BomDocument;
use crate::error::StoreResult;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based document store.
///
/// For embedders that keep documents out of the filesystem, such as an SDK
/// session built with `Session::with_store`. Entries sit behind a `RwLock`
/// and are cloned on read.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<Gitoid, Vec<u8>>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Store raw bytes under an arbitrary id, bypassing hashing.
    #[cfg(test)]
    fn insert_raw(&self, id: Gitoid, bytes: Vec<u8>) {
        self.objects.write().expect("lock poisoned").insert(id, bytes);
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn write(&self, document: &BomDocument) -> StoreResult<Gitoid> {
        let id = document.gitoid().clone();
        let mut map = self.objects.write().expect("lock poisoned");
        map.entry(id.clone())
            .or_insert_with(|| document.text().as_bytes().to_vec());
        Ok(id)
    }

    fn read(&self, id: &Gitoid) -> StoreResult<Option<Vec<u8>>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn exists(&self, id: &Gitoid) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

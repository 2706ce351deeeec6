use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mkbom_types::Gitoid;
use tracing::debug;

use crate::dirtree::{DirStack, HandleTracker};
use crate::document::BomDocument;
use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Top-level directory holding every object namespace.
pub const OBJECTS_DIR: &str = "objects";

/// Git-style sharded object store on the local filesystem.
///
/// Layout: `<root>/objects/<namespace>/<first 2 hex>/<remaining hex>`, where
/// the namespace is `gitoid_blob_sha1` or `gitoid_blob_sha256`. The root and
/// every level below it are created on demand.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
    tracker: HandleTracker,
}

impl FsObjectStore {
    /// Create a store rooted at `root`. An empty root is the current
    /// directory. Nothing is touched on disk until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_tracker(root, HandleTracker::new())
    }

    /// Create a store that reports directory handles to `tracker`.
    pub fn with_tracker(root: impl Into<PathBuf>, tracker: HandleTracker) -> Self {
        Self {
            root: root.into(),
            tracker,
        }
    }

    /// The store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The handle tracker shared with this store.
    pub fn tracker(&self) -> &HandleTracker {
        &self.tracker
    }

    /// Where the entry for `id` lives, whether or not it exists yet.
    pub fn object_path(&self, id: &Gitoid) -> PathBuf {
        self.root
            .join(OBJECTS_DIR)
            .join(id.algorithm().shard_namespace())
            .join(id.shard_prefix())
            .join(id.shard_suffix())
    }

    /// File `content` under `namespace` as the hex `name`.
    ///
    /// Levels are opened from the root down, each created if missing. On any
    /// failure every directory handle acquired by this call is released and
    /// no name is returned; levels already created stay on disk.
    pub fn persist(&self, namespace: &str, name: &str, content: &[u8]) -> StoreResult<String> {
        validate_namespace(namespace)?;
        validate_name(name)?;
        let (prefix, suffix) = name.split_at(2);

        let mut stack = DirStack::open_root(&self.root, &self.tracker)?;
        stack.descend(OBJECTS_DIR)?;
        stack.descend(namespace)?;
        let leaf = stack.descend(prefix)?.join(suffix);

        fs::write(&leaf, content).map_err(|source| StoreError::Write {
            path: leaf.clone(),
            source,
        })?;

        debug!(path = %leaf.display(), bytes = content.len(), "object persisted");
        Ok(name.to_string())
    }
}

impl ObjectStore for FsObjectStore {
    fn write(&self, document: &BomDocument) -> StoreResult<Gitoid> {
        let id = document.gitoid();
        self.persist(
            id.algorithm().shard_namespace(),
            &id.to_hex(),
            document.text().as_bytes(),
        )?;
        Ok(id.clone())
    }

    fn read(&self, id: &Gitoid) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.object_path(id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, id: &Gitoid) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }

    fn location(&self, id: &Gitoid) -> Option<PathBuf> {
        Some(self.object_path(id))
    }
}

/// A namespace is a single path component.
fn validate_namespace(namespace: &str) -> StoreResult<()> {
    let single = !namespace.is_empty()
        && namespace != "."
        && namespace != ".."
        && !namespace.contains(['/', '\\']);
    if single {
        Ok(())
    } else {
        Err(StoreError::InvalidName(namespace.to_string()))
    }
}

/// An object name is lowercase hex, long enough to shard.
fn validate_name(name: &str) -> StoreResult<()> {
    let valid = name.len() > 2
        && name
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

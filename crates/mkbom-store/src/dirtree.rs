//! Directory walking with scoped handles.
//!
//! Every directory level the store passes through is opened and kept open
//! on a [`DirStack`] until the operation finishes. Handles release on drop,
//! so an early return on any failure releases everything the call acquired.
//! Levels that were created before a failure stay on disk; they are reused
//! by the next attempt.

use std::fs::{self, DirBuilder, ReadDir};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{StoreError, StoreResult};

/// Counts live directory handles.
///
/// Cloning shares the counters, so a store and a test can observe the same
/// handles.
#[derive(Clone, Debug, Default)]
pub struct HandleTracker {
    open: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
}

impl HandleTracker {
    /// Create a tracker with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles currently open.
    pub fn open_handles(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Handles opened over the tracker's lifetime.
    pub fn total_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn acquire(&self) {
        self.open.fetch_add(1, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An open directory.
struct DirHandle {
    path: PathBuf,
    _dir: ReadDir,
    tracker: HandleTracker,
}

impl Drop for DirHandle {
    fn drop(&mut self) {
        trace!(path = %self.path.display(), "directory handle released");
        self.tracker.release();
    }
}

/// Stack of open directories from a root down to the current level.
pub struct DirStack {
    handles: Vec<DirHandle>,
    tracker: HandleTracker,
}

impl DirStack {
    /// Open `root` one component at a time, creating missing levels.
    ///
    /// An empty root means the current directory. Absolute roots start by
    /// opening the filesystem root; repeated separators collapse.
    pub fn open_root(root: &Path, tracker: &HandleTracker) -> StoreResult<Self> {
        let root = if root.as_os_str().is_empty() {
            Path::new(".")
        } else {
            root
        };

        let mut stack = Self {
            handles: Vec::new(),
            tracker: tracker.clone(),
        };
        let mut current = PathBuf::new();

        for component in root.components() {
            current.push(component.as_os_str());
            match component {
                // A drive prefix is always followed by its root directory.
                Component::Prefix(_) => continue,
                Component::Normal(_) => stack.enter(current.clone(), true)?,
                Component::RootDir | Component::CurDir | Component::ParentDir => {
                    stack.enter(current.clone(), false)?
                }
            }
        }

        debug!(root = %root.display(), depth = stack.depth(), "store root opened");
        Ok(stack)
    }

    /// Open (creating if missing) the child `name` of the current level.
    pub fn descend(&mut self, name: &str) -> StoreResult<&Path> {
        let path = self.path().join(name);
        self.enter(path, true)?;
        Ok(self.path())
    }

    /// Path of the current (deepest) level.
    pub fn path(&self) -> &Path {
        self.handles
            .last()
            .map_or_else(|| Path::new("."), |handle| handle.path.as_path())
    }

    /// Number of open levels.
    pub fn depth(&self) -> usize {
        self.handles.len()
    }

    fn enter(&mut self, path: PathBuf, create: bool) -> StoreResult<()> {
        let dir = match fs::read_dir(&path) {
            Ok(dir) => dir,
            Err(e) if create && e.kind() == io::ErrorKind::NotFound => {
                if let Err(source) = create_dir(&path) {
                    return Err(StoreError::Directory { path, source });
                }
                match fs::read_dir(&path) {
                    Ok(dir) => dir,
                    Err(source) => return Err(StoreError::Directory { path, source }),
                }
            }
            Err(source) => return Err(StoreError::Directory { path, source }),
        };

        self.tracker.acquire();
        trace!(path = %path.display(), "directory handle opened");
        self.handles.push(DirHandle {
            path,
            _dir: dir,
            tracker: self.tracker.clone(),
        });
        Ok(())
    }
}

/// Create a single directory, owner-only on Unix. An existing directory is
/// success, so concurrent builds racing on the same level both proceed.
fn create_dir(path: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    match builder.create(path) {
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        other => other,
    }
}

//! Provenance metadata.
//!
//! One metadata file binds a build output to the gitoids and absolute paths
//! of the inputs it was built from:
//!
//! ```text
//! outfile:  path: /abs/out/main.o
//! infile: 2e65efe2a145dda7ee51d1741299f848e5bf752e path: /abs/src/a.h
//! infile: 63d8dbd40c23542e740659a7168a0ce3138ea748 path: /abs/src/b.h
//! build_cmd: gcc -c main.c
//! ```
//!
//! Files live at `<root>/metadata/gnu/<namespace>/<output name>.metadata`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use mkbom_types::{CompileMode, DependencyRecord, HashAlgorithm};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dirtree::{DirStack, HandleTracker};
use crate::error::{StoreError, StoreResult};

/// Top-level directory holding metadata.
pub const METADATA_DIR: &str = "metadata";

/// Producer directory under [`METADATA_DIR`].
pub const PRODUCER_DIR: &str = "gnu";

/// Extension of metadata files.
pub const METADATA_EXTENSION: &str = "metadata";

/// Written in place of an output path that could not be resolved.
pub const NOT_AVAILABLE: &str = "not available";

/// What the build driver knows about the step being recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildContext {
    /// Output named explicitly by the driver (`-o`).
    pub output: Option<PathBuf>,
    /// How far the step runs.
    pub mode: CompileMode,
    /// Command line recorded verbatim in the `build_cmd` field.
    pub build_cmd: Option<String>,
}

impl BuildContext {
    /// The output this step produces, if any.
    ///
    /// An explicit output always wins. Otherwise compile and assemble steps
    /// name the output after `primary_input` with its extension replaced, a
    /// link step produces `a.out`, and a preprocess step produces nothing.
    pub fn resolve_output(&self, primary_input: Option<&str>) -> Option<PathBuf> {
        if let Some(output) = &self.output {
            return Some(output.clone());
        }

        match self.mode {
            CompileMode::PreprocessOnly => None,
            CompileMode::Link => Some(PathBuf::from(CompileMode::LINK_DEFAULT_OUTPUT)),
            CompileMode::CompileOnly | CompileMode::AssembleOnly => {
                let suffix = self.mode.output_suffix()?;
                let stem = Path::new(primary_input?).file_stem()?;
                let mut name = stem.to_os_string();
                name.push(suffix);
                Some(PathBuf::from(name))
            }
        }
    }
}

/// Writes metadata files under a store root.
#[derive(Clone, Debug)]
pub struct MetadataRecorder {
    root: PathBuf,
    tracker: HandleTracker,
}

impl MetadataRecorder {
    /// Create a recorder rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_tracker(root, HandleTracker::new())
    }

    /// Create a recorder that reports directory handles to `tracker`.
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

    /// Where the metadata for `output` would be written.
    pub fn metadata_path(&self, algorithm: HashAlgorithm, output: &Path) -> StoreResult<PathBuf> {
        Ok(self
            .root
            .join(METADATA_DIR)
            .join(PRODUCER_DIR)
            .join(algorithm.shard_namespace())
            .join(metadata_file_name(output)?))
    }

    /// Write the metadata for one build step.
    ///
    /// `records` are written in the order given, which should be BOM order.
    /// Returns `Ok(None)` without touching the disk when the step produces
    /// no output.
    pub fn record(
        &self,
        algorithm: HashAlgorithm,
        context: &BuildContext,
        primary_input: Option<&str>,
        records: &[DependencyRecord],
    ) -> StoreResult<Option<PathBuf>> {
        let Some(output) = context.resolve_output(primary_input) else {
            debug!(mode = %context.mode, "no output produced; metadata skipped");
            return Ok(None);
        };
        let file_name = metadata_file_name(&output)?;

        let mut stack = DirStack::open_root(&self.root, &self.tracker)?;
        stack.descend(METADATA_DIR)?;
        stack.descend(PRODUCER_DIR)?;
        let path = stack.descend(algorithm.shard_namespace())?.join(file_name);

        let content = render(&output, records, context.build_cmd.as_deref());
        fs::write(&path, content).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(
            path = %path.display(),
            output = %output.display(),
            inputs = records.len(),
            "provenance metadata written"
        );
        Ok(Some(path))
    }
}

/// Render the text of a metadata file.
pub fn render(output: &Path, records: &[DependencyRecord], build_cmd: Option<&str>) -> String {
    let mut text = String::new();

    let outfile = resolve_output_path(output);
    let outfile = outfile
        .as_deref()
        .map_or_else(|| NOT_AVAILABLE.into(), |p| p.display().to_string());
    // Writing to a String cannot fail.
    let _ = writeln!(text, "outfile:  path: {outfile}");

    for record in records {
        let _ = writeln!(
            text,
            "infile: {} path: {}",
            record.gitoid.to_hex(),
            resolve_input_path(&record.path).display()
        );
    }

    let _ = writeln!(text, "build_cmd: {}", build_cmd.unwrap_or_default());
    text
}

fn metadata_file_name(output: &Path) -> StoreResult<String> {
    let name = output
        .file_name()
        .ok_or_else(|| StoreError::InvalidName(output.display().to_string()))?;
    Ok(format!("{}.{METADATA_EXTENSION}", name.to_string_lossy()))
}

/// The output may not exist yet, so fall back to resolving its directory.
fn resolve_output_path(output: &Path) -> Option<PathBuf> {
    if let Ok(path) = fs::canonicalize(output) {
        return Some(path);
    }
    let name = output.file_name()?;
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::canonicalize(parent).ok().map(|dir| dir.join(name))
}

fn resolve_input_path(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

//! BOM documents and their content-addressed storage.
//!
//! This crate turns hashed dependencies into OmniBOR documents and files
//! them in a Git-style object tree:
//!
//! ```text
//! <root>/objects/gitoid_blob_sha1/50/79f42d94056d1789d1a39c853748c58186e7ca
//! <root>/metadata/gnu/gitoid_blob_sha1/main.o.metadata
//! ```
//!
//! # Key Types
//!
//! - [`BomBuilder`] -- hashes dependency files and builds a [`BomDocument`]
//! - [`ObjectStore`] -- the document store contract
//! - [`FsObjectStore`] -- sharded on-disk store
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for embedding
//! - [`MetadataRecorder`] -- writes the provenance record for a build output
//! - [`OmniborNote`] -- the `.note.omnibor` payload naming a document
//!
//! # Design Rules
//!
//! 1. Entries are immutable: a name is the gitoid of its bytes.
//! 2. Rewriting an entry is harmless, so concurrent builds need no locks.
//! 3. Directory creation treats "already exists" as success.
//! 4. Every directory handle a call opens is released on every exit path.

pub mod dirtree;
pub mod document;
pub mod error;
pub mod fs;
pub mod memory;
pub mod metadata;
pub mod note;
pub mod traits;

pub use dirtree::{DirStack, HandleTracker};
pub use document::{BomBuilder, BomDocument, DependencyScan};
pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use metadata::{BuildContext, MetadataRecorder};
pub use note::OmniborNote;
pub use traits::ObjectStore;

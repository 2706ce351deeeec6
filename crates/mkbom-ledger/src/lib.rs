//! Dependency ledger for mkbom.
//!
//! The ledger is the in-memory record of what one build step read: its
//! targets, its dependency files, the vpath prefixes stripped from those
//! paths, and any language-module names. It provides:
//! - [`DependencyLedger`], the ordered, insertion-stable registry
//! - [`VpathTable`], prefix rewriting applied to every recorded path
//! - [`MakeWriter`], classic Make dependency rules from a ledger
//! - [`snapshot`], the length-prefixed persisted form used for reuse

pub mod error;
pub mod ledger;
pub mod make;
pub mod snapshot;
pub mod vpath;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{DependencyLedger, ModuleTarget, OBJECT_SUFFIX};
pub use make::{munge, MakeOptions, MakeWriter};
pub use vpath::VpathTable;

//! High-level API for mkbom.
//!
//! A [`Session`] follows one build step: the driver records what the step
//! read on the session's ledger, then [`Session::finish`] hashes the
//! dependencies, stores a BOM document per configured algorithm, and writes
//! the provenance metadata. This is the main entry point for build drivers
//! embedding mkbom.

pub mod config;
pub mod error;
pub mod report;
pub mod session;

pub use config::BomConfig;
pub use error::{SdkError, SdkResult};
pub use report::{AlgorithmReport, SessionReport};
pub use session::Session;

// Re-export key types
pub use mkbom_ledger::{DependencyLedger, MakeOptions};
pub use mkbom_store::{BuildContext, OmniborNote};
pub use mkbom_types::{CompileMode, Gitoid, HashAlgorithm};

//! Foundation types for mkbom.
//!
//! This crate provides the identifier and configuration types shared by every
//! other mkbom crate.
//!
//! # Key Types
//!
//! - [`HashAlgorithm`] -- SHA-1 or SHA-256, the build-wide gitoid algorithm
//! - [`Gitoid`] -- Git-blob-compatible content identifier
//! - [`CompileMode`] -- How far the build step runs
//! - [`DependencyRecord`] -- A dependency path bound to its gitoid

pub mod algorithm;
pub mod error;
pub mod gitoid;
pub mod mode;
pub mod record;

pub use algorithm::HashAlgorithm;
pub use error::TypeError;
pub use gitoid::Gitoid;
pub use mode::CompileMode;
pub use record::DependencyRecord;

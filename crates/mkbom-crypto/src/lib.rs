//! Gitoid hashing for mkbom.
//!
//! A gitoid is the Git blob hash of a byte sequence: the digest of
//! `"blob " + decimal(len) + NUL + content`. Both SHA-1 and SHA-256 are
//! supported and produce the same identifiers as `git hash-object` in the
//! corresponding object format.
//!
//! Digests come from the RustCrypto `sha1` and `sha2` crates.

pub mod hasher;

pub use hasher::{GitoidHasher, HasherError};

//! Shared value types for xenv.
//!
//! Everything here is an immutable value: target triples, logical library
//! names, concrete package names and the environment overrides handed to
//! the build toolchain. No I/O happens in this crate.

/// Debian multi-arch naming derived from target triples.
pub mod multiarch;
pub mod triple;
/// Library, package and environment-variable value types.
pub mod types;

// Re-exports
pub use multiarch::Multiarch;
pub use triple::{TargetTriple, TripleError};
pub use types::*;

//! Shared test infrastructure.

/// Controller and run builders.
pub mod harness;

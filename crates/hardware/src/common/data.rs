//! Memory Access Types.
//!
//! This module defines the classification of memory accesses used throughout the simulator.
//! These types are used for the following:
//! 1. **Observation Records:** Tagging each executed instruction as a read or a write.
//! 2. **Statistics Tracking:** Categorizing memory operations for per-core counters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Single-byte datum stored in memory and in cache lines.
pub type Value = u8;

/// Index of a simulated core, in `[0, num_cores)`.
pub type CoreId = usize;

/// Type of memory access operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessKind {
    /// Data read access (`RD`).
    Read,

    /// Data write access (`WR`).
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "RD"),
            Self::Write => write!(f, "WR"),
        }
    }
}

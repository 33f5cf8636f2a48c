//! Per-core caches and the coherence protocol.
//!
//! This module contains the hardware model proper:
//! 1. **Cache:** Direct-mapped lines and the MESI per-line state machine.
//! 2. **Coherence:** The controller that owns every line plus shared memory and
//!    runs each instruction as one snooping transaction.

/// Cache lines and MESI states.
pub mod cache;
/// Coherence controller, snapshots, and invariant checks.
pub mod coherence;

pub use self::cache::{CacheLine, MesiState};
pub use self::coherence::{CoherenceController, Execution, Observation};

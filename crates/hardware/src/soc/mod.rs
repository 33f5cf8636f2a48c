//! Shared-system Components.
//!
//! This module organizes the components shared by all simulated cores. The bus
//! itself is abstracted away into the lock domains of the coherence controller,
//! so the only shared component left is main memory.

/// Shared byte-addressable memory and the memory domain lock.
pub mod memory;

pub use memory::SharedMemory;

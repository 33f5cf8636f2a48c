//! Shared-memory address type.
//!
//! This module defines the strong address type used by every component that touches
//! shared memory or cache lines. It provides the following:
//! 1. **Type Safety:** Keeps byte addresses apart from core ids, slot indices, and values.
//! 2. **Direct Mapping:** Computes the cache slot an address maps to.
//! 3. **Formatting:** Renders addresses the way the observation log prints them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A byte address in shared memory.
///
/// Valid addresses lie in `[0, memory_size)`; bounds are enforced by
/// [`SharedMemory`](crate::soc::memory::SharedMemory), not by this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub usize);

impl Address {
    /// Creates a new address from a raw index.
    ///
    /// # Arguments
    ///
    /// * `addr` - The raw byte index.
    ///
    /// # Returns
    ///
    /// A new `Address` wrapping the provided index.
    #[inline(always)]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Returns the raw byte index.
    #[inline(always)]
    pub const fn val(self) -> usize {
        self.0
    }

    /// Returns the direct-mapped cache slot for this address.
    ///
    /// # Arguments
    ///
    /// * `cache_slots` - Number of slots per core cache; must be non-zero.
    ///
    /// # Returns
    ///
    /// `address mod cache_slots`.
    #[inline(always)]
    pub const fn slot(self, cache_slots: usize) -> usize {
        self.0 % cache_slots
    }
}

impl From<u8> for Address {
    fn from(addr: u8) -> Self {
        Self(usize::from(addr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

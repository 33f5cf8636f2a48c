//! Shared System Memory.
//!
//! This module implements the global byte-addressable store every core's cache
//! fills from and writes back to. It provides:
//! 1. **Storage:** A fixed-size, zero-initialized byte array, never resized.
//! 2. **Memory Domain:** A single mutex serializing every access across cores.
//! 3. **Eviction Pair:** Writeback of an old line and refill of a new one in one critical section.
//! 4. **Bounds Checking:** Out-of-range addresses fail with [`SimError::OutOfBounds`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::common::{Address, SimError, Value};

/// Global shared memory guarded by the memory domain lock.
#[derive(Debug)]
pub struct SharedMemory {
    cells: Mutex<Vec<Value>>,
    size: usize,
}

impl SharedMemory {
    /// Creates a zero-filled memory of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            cells: Mutex::new(vec![0; size]),
            size,
        }
    }

    /// Returns the size of memory in bytes.
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` for a zero-sized memory.
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Verifies that `address` lies inside memory without taking the lock.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::OutOfBounds`] if `address >= len()`.
    pub fn check(&self, address: Address) -> Result<(), SimError> {
        if address.val() < self.size {
            Ok(())
        } else {
            Err(SimError::OutOfBounds {
                address,
                size: self.size,
            })
        }
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::OutOfBounds`] if `address` is outside memory.
    pub fn read(&self, address: Address) -> Result<Value, SimError> {
        self.check(address)?;
        Ok(self.lock()[address.val()])
    }

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::OutOfBounds`] if `address` is outside memory.
    pub fn write(&self, address: Address, value: Value) -> Result<(), SimError> {
        self.check(address)?;
        self.lock()[address.val()] = value;
        Ok(())
    }

    /// Flushes `value` to `old` and then reads `new`, atomically.
    ///
    /// The flush always lands before the refill is read, so evicting the only
    /// up-to-date copy of `old` never loses it, even when `old == new`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::OutOfBounds`] if either address is outside memory;
    /// nothing is written in that case.
    pub fn write_back_and_refill(
        &self,
        old: Address,
        value: Value,
        new: Address,
    ) -> Result<Value, SimError> {
        self.check(old)?;
        self.check(new)?;
        let mut cells = self.lock();
        cells[old.val()] = value;
        Ok(cells[new.val()])
    }

    /// Copies `data` into memory starting at `offset`.
    ///
    /// Used to seed memory contents before a run.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::OutOfBounds`] naming the first byte past the end if
    /// `data` does not fit.
    pub fn load(&self, offset: usize, data: &[u8]) -> Result<(), SimError> {
        let end = offset.saturating_add(data.len());
        if end > self.size {
            return Err(SimError::OutOfBounds {
                address: Address::new(self.size.max(offset)),
                size: self.size,
            });
        }
        self.lock()[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Returns a copy of every byte of memory.
    pub fn snapshot(&self) -> Vec<Value> {
        self.lock().clone()
    }

    /// Acquires the memory domain.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<Value>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

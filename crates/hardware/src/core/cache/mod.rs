//! Direct-Mapped Cache Lines.
//!
//! This module defines the per-core, per-slot storage unit of the simulator.
//! Each core owns `cache_slots` lines; address `A` always maps to slot
//! `A mod cache_slots`. Lines are created Invalid and are mutated only by the
//! coherence controller.

/// MESI states and the line transition table.
pub mod state;

use std::fmt;

use serde::Serialize;

pub use self::state::{LineEvent, MesiState};
use crate::common::{Address, Value};

/// One cache line: the address it currently maps, its data byte, and its MESI state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheLine {
    /// Address held by the line; `None` until the line is first filled.
    pub address: Option<Address>,
    /// Cached data byte.
    pub value: Value,
    /// Coherence state.
    pub state: MesiState,
}

impl CacheLine {
    /// An unused line: no address, value 0, Invalid.
    pub const EMPTY: Self = Self {
        address: None,
        value: 0,
        state: MesiState::Invalid,
    };

    /// Returns `true` if the line maps `address`, regardless of state.
    pub fn maps(&self, address: Address) -> bool {
        self.address == Some(address)
    }

    /// Returns `true` if the line holds a valid copy of `address`.
    pub fn holds(&self, address: Address) -> bool {
        self.maps(address) && self.state.is_valid()
    }

    /// Returns the address that must be flushed before the line can serve `target`.
    ///
    /// `Some(old)` when the line maps a different address and its state requires
    /// a writeback on eviction.
    pub fn eviction_for(&self, target: Address) -> Option<Address> {
        match self.address {
            Some(old) if old != target && self.state.flushes_on_evict() => Some(old),
            _ => None,
        }
    }

    /// Applies `event` to the line's state.
    pub fn apply(&mut self, event: LineEvent) {
        self.state = self.state.next(event);
    }
}

impl fmt::Display for CacheLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(address) => write!(
                f,
                "Address: {address}, State: {:<9}, Value: {:02}",
                self.state, self.value
            ),
            None => write!(
                f,
                "Address: --, State: {:<9}, Value: {:02}",
                self.state, self.value
            ),
        }
    }
}

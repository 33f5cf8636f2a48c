//! System snapshots and coherence invariant checking.
//!
//! A [`SystemSnapshot`] is a frozen copy of every core's lines and of shared memory,
//! taken while no transaction is in flight. It renders the state dump printed in
//! debug runs and checks the protocol invariants:
//! 1. At most one core holds an address Modified.
//! 2. A Modified or Exclusive line is the only valid copy of its address.
//! 3. Every Shared or Exclusive line agrees with memory.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::common::{Address, CoreId, Value};
use crate::core::cache::{CacheLine, MesiState};

/// A broken coherence invariant found in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CoherenceViolation {
    /// More than one core holds the address Modified.
    #[error("address {address} is Modified in cores {cores:?}")]
    MultipleOwners {
        /// Affected address.
        address: Address,
        /// Every core holding it Modified.
        cores: Vec<CoreId>,
    },

    /// A Modified or Exclusive owner coexists with another valid copy.
    #[error("address {address} is {state} in core {owner} but also valid in core {other}")]
    OwnerNotAlone {
        /// Affected address.
        address: Address,
        /// State of the owning line.
        state: MesiState,
        /// Owning core.
        owner: CoreId,
        /// Core holding the conflicting copy.
        other: CoreId,
    },

    /// A clean (Shared or Exclusive) line disagrees with memory.
    #[error("address {address} is clean in core {core} with value {cached} but memory holds {memory}")]
    StaleCleanCopy {
        /// Affected address.
        address: Address,
        /// Core holding the stale line.
        core: CoreId,
        /// Value in the line.
        cached: Value,
        /// Value in memory.
        memory: Value,
    },
}

/// Frozen copy of all cache lines and memory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SystemSnapshot {
    /// `cores[core][slot]`.
    pub cores: Vec<Vec<CacheLine>>,
    /// Every byte of shared memory.
    pub memory: Vec<Value>,
}

impl SystemSnapshot {
    /// Wraps raw line and memory copies.
    pub const fn new(cores: Vec<Vec<CacheLine>>, memory: Vec<Value>) -> Self {
        Self { cores, memory }
    }

    /// Returns one core's line at `slot`.
    pub fn line(&self, core: CoreId, slot: usize) -> Option<&CacheLine> {
        self.cores.get(core)?.get(slot)
    }

    /// Returns every `(core, state)` holding a valid copy of `address`.
    pub fn holders(&self, address: Address) -> Vec<(CoreId, MesiState)> {
        self.cores
            .iter()
            .enumerate()
            .flat_map(|(core, lines)| {
                lines
                    .iter()
                    .filter(move |line| line.holds(address))
                    .map(move |line| (core, line.state))
            })
            .collect()
    }

    /// Lists every invariant violation in the snapshot.
    pub fn violations(&self) -> Vec<CoherenceViolation> {
        let mut by_address: BTreeMap<Address, Vec<(CoreId, CacheLine)>> = BTreeMap::new();
        for (core, lines) in self.cores.iter().enumerate() {
            for line in lines.iter().filter(|line| line.state.is_valid()) {
                if let Some(address) = line.address {
                    by_address.entry(address).or_default().push((core, *line));
                }
            }
        }

        let mut found = Vec::new();
        for (address, copies) in by_address {
            let owners: Vec<CoreId> = copies
                .iter()
                .filter(|(_, line)| line.state == MesiState::Modified)
                .map(|(core, _)| *core)
                .collect();
            if owners.len() > 1 {
                found.push(CoherenceViolation::MultipleOwners {
                    address,
                    cores: owners,
                });
            }

            let exclusive = copies.iter().find(|(_, line)| {
                matches!(line.state, MesiState::Modified | MesiState::Exclusive)
            });
            if let Some((owner, line)) = exclusive {
                if let Some((other, _)) = copies.iter().find(|(core, _)| core != owner) {
                    found.push(CoherenceViolation::OwnerNotAlone {
                        address,
                        state: line.state,
                        owner: *owner,
                        other: *other,
                    });
                }
            }

            let memory = self.memory.get(address.val()).copied();
            for (core, line) in &copies {
                if line.state.is_dirty() {
                    continue;
                }
                if let Some(memory) = memory.filter(|m| *m != line.value) {
                    found.push(CoherenceViolation::StaleCleanCopy {
                        address,
                        core: *core,
                        cached: line.value,
                        memory,
                    });
                }
            }
        }
        found
    }

    /// Checks every protocol invariant.
    ///
    /// # Errors
    ///
    /// Returns the first [`CoherenceViolation`] found.
    pub fn check_coherence(&self) -> Result<(), CoherenceViolation> {
        match self.violations().into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }
}

impl fmt::Display for SystemSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Memory:")?;
        for (addr, value) in self.memory.iter().enumerate() {
            write!(f, " {addr:02}:{value:02}")?;
        }
        writeln!(f)?;
        for (core, lines) in self.cores.iter().enumerate() {
            writeln!(f, "\tCore {core}")?;
            for line in lines {
                writeln!(f, "\t\t{line}")?;
            }
        }
        Ok(())
    }
}

//! MESI Coherence Controller.
//!
//! This module owns every cache line of every core together with shared memory,
//! and is the only code allowed to mutate either. It provides:
//! 1. **Execution:** `execute(core, instruction)`, one logically atomic line transaction.
//! 2. **Snooping:** Invalidate-on-write broadcast and first-sharer forwarding on read miss.
//! 3. **Eviction:** Writeback of Modified/Shared lines before a slot is reused.
//! 4. **Inspection:** Consistent snapshots for state dumps and invariant checks.
//!
//! # Lock domains
//!
//! * **Cache domain:** one mutex per slot index, guarding that slot on every core.
//!   An address maps to exactly one slot, so holding the slot lock covers the
//!   whole read-modify-write of the local line and every snoop on peers.
//! * **Memory domain:** the mutex inside [`SharedMemory`].
//!
//! Locks are always taken slot first, then memory. Only [`CoherenceController::snapshot`]
//! holds more than one slot lock, and it takes them in ascending order.

/// Snapshots and coherence invariant checking.
pub mod snapshot;

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::trace;

pub use self::snapshot::{CoherenceViolation, SystemSnapshot};
use crate::common::{AccessKind, Address, CoreId, SimError, Value};
use crate::config::SystemConfig;
use crate::core::cache::{CacheLine, LineEvent, MesiState};
use crate::isa::Instruction;
use crate::soc::SharedMemory;

/// What an executed instruction resolved to; one record per instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Observation {
    /// Executing core.
    pub core: CoreId,
    /// Read or write.
    pub kind: AccessKind,
    /// Address the core's line holds after execution.
    pub address: Address,
    /// Value the core's line holds after execution.
    pub value: Value,
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AccessKind::Read => write!(
                f,
                "Core {} Reading from address {}: {:02}",
                self.core, self.address, self.value
            ),
            AccessKind::Write => write!(
                f,
                "Core {} Writing   to address {}: {:02}",
                self.core, self.address, self.value
            ),
        }
    }
}

/// Where a read miss got its data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FillSource {
    /// Fetched from shared memory; the line became Exclusive.
    Memory,
    /// Copied from the given peer core; both lines became Shared.
    Peer(CoreId),
}

/// Protocol side effects of one instruction, used for statistics and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Effects {
    /// A read found its address already valid in the local line.
    pub hit: bool,
    /// Source of the data on a read miss.
    pub fill: Option<FillSource>,
    /// Address flushed to memory because the slot was reassigned.
    pub evicted: Option<Address>,
    /// Number of values written back to memory (eviction and snoop flushes).
    pub writebacks: u32,
    /// Number of valid peer lines invalidated by a write.
    pub invalidations: u32,
}

/// Result of [`CoherenceController::execute`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Execution {
    /// The record the caller reports.
    pub observation: Observation,
    /// State of the executing core's line afterwards.
    pub state: MesiState,
    /// Protocol side effects.
    pub effects: Effects,
}

/// Owner of all cache-line and shared-memory state.
#[derive(Debug)]
pub struct CoherenceController {
    num_cores: usize,
    cache_slots: usize,
    /// `slots[slot][core]`; each mutex is the cache domain for one slot index.
    slots: Vec<Mutex<Vec<CacheLine>>>,
    memory: SharedMemory,
}

impl CoherenceController {
    /// Builds a controller with every line Invalid and memory holding
    /// `system.initial_memory` followed by zeros.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if any dimension is zero or the
    /// initial image does not fit.
    pub fn new(system: &SystemConfig) -> Result<Self, SimError> {
        system.validate()?;
        let slots = (0..system.cache_slots)
            .map(|_| Mutex::new(vec![CacheLine::EMPTY; system.num_cores]))
            .collect();
        let memory = SharedMemory::new(system.memory_size);
        memory.load(0, &system.initial_memory)?;
        Ok(Self {
            num_cores: system.num_cores,
            cache_slots: system.cache_slots,
            slots,
            memory,
        })
    }

    /// Number of cores this controller serves.
    pub const fn num_cores(&self) -> usize {
        self.num_cores
    }

    /// Number of direct-mapped slots per core.
    pub const fn cache_slots(&self) -> usize {
        self.cache_slots
    }

    /// Shared memory owned by this controller.
    pub const fn memory(&self) -> &SharedMemory {
        &self.memory
    }

    /// Returns a copy of one core's line at `slot`, or `None` if out of range.
    pub fn line(&self, core: CoreId, slot: usize) -> Option<CacheLine> {
        let lines = self.slots.get(slot)?;
        let lines = lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.get(core).copied()
    }

    /// Executes one instruction on behalf of `core`.
    ///
    /// The whole transaction (eviction, local commit, snoops) runs under the
    /// slot's cache-domain lock, so conflicting remote snoops on the same slot
    /// never interleave with it.
    ///
    /// # Errors
    ///
    /// * [`SimError::UnknownCore`] if `core` is out of range.
    /// * [`SimError::OutOfBounds`] if the target address is outside memory.
    ///
    /// Both are detected before any state changes.
    pub fn execute(&self, core: CoreId, instruction: Instruction) -> Result<Execution, SimError> {
        if core >= self.num_cores {
            return Err(SimError::UnknownCore {
                core,
                num_cores: self.num_cores,
            });
        }
        let target = instruction.address();
        self.memory.check(target)?;

        let slot = target.slot(self.cache_slots);
        let mut lines = self.lock_slot(slot);
        let mut effects = Effects::default();

        if let Some(old) = lines[core].eviction_for(target) {
            let refill = self
                .memory
                .write_back_and_refill(old, lines[core].value, target)?;
            trace!(core, slot, old = %old, new = %target, "flushed evicted line");
            let line = &mut lines[core];
            line.address = Some(target);
            line.value = refill;
            line.apply(LineEvent::Evict);
            effects.evicted = Some(old);
            effects.writebacks += 1;
        }

        match instruction {
            Instruction::Write { address, value } => {
                let line = &mut lines[core];
                line.address = Some(address);
                line.value = value;
                line.apply(LineEvent::LocalWrite);

                for (peer, line) in lines.iter_mut().enumerate() {
                    if peer == core || !line.maps(address) {
                        continue;
                    }
                    if line.state.is_valid() {
                        trace!(core, peer, address = %address, "invalidated peer copy");
                        effects.invalidations += 1;
                    }
                    line.apply(LineEvent::SnoopWrite);
                }
            }
            Instruction::Read { address } => {
                if lines[core].holds(address) {
                    lines[core].apply(LineEvent::LocalReadHit);
                    effects.hit = true;
                } else {
                    let sharer = lines
                        .iter()
                        .enumerate()
                        .find(|(peer, line)| *peer != core && line.holds(address))
                        .map(|(peer, _)| peer);

                    let (value, event) = match sharer {
                        Some(peer) => {
                            let value = lines[peer].value;
                            if lines[peer].state.is_dirty() {
                                self.memory.write(address, value)?;
                                effects.writebacks += 1;
                            }
                            trace!(core, peer, address = %address, from = %lines[peer].state, "forwarded peer copy");
                            lines[peer].apply(LineEvent::SnoopRead);
                            effects.fill = Some(FillSource::Peer(peer));
                            (value, LineEvent::FillFromPeer)
                        }
                        None => {
                            effects.fill = Some(FillSource::Memory);
                            (self.memory.read(address)?, LineEvent::FillFromMemory)
                        }
                    };

                    let line = &mut lines[core];
                    line.address = Some(address);
                    line.value = value;
                    line.apply(event);
                }
            }
        }

        let line = lines[core];
        Ok(Execution {
            observation: Observation {
                core,
                kind: instruction.kind(),
                address: target,
                value: line.value,
            },
            state: line.state,
            effects,
        })
    }

    /// Takes a consistent snapshot of every line and all of memory.
    ///
    /// Blocks until no transaction is in flight on any slot.
    pub fn snapshot(&self) -> SystemSnapshot {
        let guards: Vec<_> = (0..self.cache_slots).map(|slot| self.lock_slot(slot)).collect();
        let memory = self.memory.snapshot();
        let cores = (0..self.num_cores)
            .map(|core| guards.iter().map(|lines| lines[core]).collect())
            .collect();
        SystemSnapshot::new(cores, memory)
    }

    /// Acquires the cache domain for one slot.
    fn lock_slot(&self, slot: usize) -> MutexGuard<'_, Vec<CacheLine>> {
        self.slots[slot]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

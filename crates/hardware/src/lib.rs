//! MESI cache-coherence simulator library.
//!
//! This crate simulates a small shared-memory multiprocessor in which every core
//! runs on its own OS thread and owns a private direct-mapped cache kept
//! coherent with the MESI protocol. It provides:
//! 1. **Core:** Cache lines, the MESI state machine, and the coherence controller.
//! 2. **Memory:** Byte-addressable shared memory behind its own lock domain.
//! 3. **ISA:** Decoding of the `RD <addr>` / `WR <addr> <value>` instruction format.
//! 4. **Simulation:** Instruction sources, the clock barrier, and the scheduler.
//! 5. **Reporting:** Observation sinks, configuration, and statistics.

/// Common types (addresses, values, access kinds, errors).
pub mod common;
/// Simulator configuration (defaults, execution mode, system dimensions).
pub mod config;
/// Caches and the coherence protocol.
pub mod core;
/// Instruction format (decode, instruction).
pub mod isa;
/// Instruction sources, barrier, scheduler, and sinks.
pub mod sim;
/// Shared memory.
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or parse from JSON.
pub use crate::config::Config;
/// Owner of all cache and memory state; executes instructions.
pub use crate::core::CoherenceController;
/// Runs one context per core in lock-step.
pub use crate::sim::ClockScheduler;

//! Simulation driver.
//!
//! Provides the per-core instruction streams, the clock barrier and scheduler
//! that lock-step core contexts, and the sinks that receive their observations.

/// Cycle barrier with a shrinking participant set.
pub mod barrier;
/// Opening per-core instruction files.
pub mod loader;
/// Observation sinks.
pub mod report;
/// Per-core thread scheduling and the run loop.
pub mod scheduler;
/// Instruction stream trait and implementations.
pub mod source;

pub use self::report::{EventLog, ObservationSink, TextSink};
pub use self::scheduler::{ClockScheduler, CoreReport, RunSummary};
pub use self::source::{InstructionSource, ProgramSource, TextSource};

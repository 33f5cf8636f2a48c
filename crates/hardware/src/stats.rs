//! Simulation statistics collection and reporting.
//!
//! This module tracks coherence-protocol metrics for a run. It provides:
//! 1. **Per-core counters:** Reads, writes, hits, misses, and fill sources.
//! 2. **Protocol traffic:** Writebacks and invalidations each core caused.
//! 3. **Reporting:** A text banner on stdout and `serde` serialization for JSON.

use std::ops::AddAssign;

use serde::Serialize;

use crate::core::coherence::{Execution, FillSource};
use crate::common::AccessKind;

/// Counters for one core's executed instructions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CoreStats {
    /// `RD` instructions executed.
    pub reads: u64,
    /// `WR` instructions executed.
    pub writes: u64,
    /// Reads served by the core's own valid line.
    pub read_hits: u64,
    /// Reads that had to fill the line.
    pub read_misses: u64,
    /// Read misses served by a peer's copy.
    pub peer_fills: u64,
    /// Read misses served by shared memory.
    pub memory_fills: u64,
    /// Lines flushed to memory on eviction.
    pub evictions: u64,
    /// Values written back to memory (eviction and snoop flushes).
    pub writebacks: u64,
    /// Valid peer lines this core's writes invalidated.
    pub invalidations_sent: u64,
}

impl CoreStats {
    /// Accumulates one executed instruction.
    pub fn record(&mut self, execution: &Execution) {
        let effects = &execution.effects;
        match execution.observation.kind {
            AccessKind::Read => {
                self.reads += 1;
                if effects.hit {
                    self.read_hits += 1;
                } else {
                    self.read_misses += 1;
                }
            }
            AccessKind::Write => self.writes += 1,
        }
        match effects.fill {
            Some(FillSource::Peer(_)) => self.peer_fills += 1,
            Some(FillSource::Memory) => self.memory_fills += 1,
            None => {}
        }
        if effects.evicted.is_some() {
            self.evictions += 1;
        }
        self.writebacks += u64::from(effects.writebacks);
        self.invalidations_sent += u64::from(effects.invalidations);
    }

    /// Total instructions executed.
    pub const fn instructions(&self) -> u64 {
        self.reads + self.writes
    }

    /// Fraction of reads that hit, in `[0, 1]`; 0 when nothing was read.
    pub fn hit_rate(&self) -> f64 {
        if self.reads == 0 {
            0.0
        } else {
            self.read_hits as f64 / self.reads as f64
        }
    }
}

impl AddAssign for CoreStats {
    fn add_assign(&mut self, rhs: Self) {
        self.reads += rhs.reads;
        self.writes += rhs.writes;
        self.read_hits += rhs.read_hits;
        self.read_misses += rhs.read_misses;
        self.peer_fills += rhs.peer_fills;
        self.memory_fills += rhs.memory_fills;
        self.evictions += rhs.evictions;
        self.writebacks += rhs.writebacks;
        self.invalidations_sent += rhs.invalidations_sent;
    }
}

/// Whole-run statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    /// Completed clock cycles.
    pub cycles: u64,
    /// Per-core counters, indexed by core id.
    pub cores: Vec<CoreStats>,
}

impl SimStats {
    /// Sums every core's counters.
    pub fn totals(&self) -> CoreStats {
        self.cores.iter().fold(CoreStats::default(), |mut acc, core| {
            acc += *core;
            acc
        })
    }

    /// Prints the statistics banner to stdout.
    pub fn print(&self) {
        let total = self.totals();
        println!("\n==========================================================");
        println!("MESI COHERENCE SIMULATION STATISTICS");
        println!("==========================================================");
        println!("sim_cycles               {}", self.cycles);
        println!("sim_insts                {}", total.instructions());
        println!("sim_reads                {}", total.reads);
        println!("sim_writes               {}", total.writes);
        println!("----------------------------------------------------------");
        println!("PER-CORE CACHE ACTIVITY");
        for (core, stats) in self.cores.iter().enumerate() {
            println!(
                "  core{:<3} reads: {:<8} | hits: {:<8} | hit_rate: {:.2}%",
                core,
                stats.reads,
                stats.read_hits,
                stats.hit_rate() * 100.0
            );
        }
        println!("----------------------------------------------------------");
        println!("COHERENCE TRAFFIC");
        println!("  fill.memory            {}", total.memory_fills);
        println!("  fill.peer              {}", total.peer_fills);
        println!("  evictions              {}", total.evictions);
        println!("  writebacks             {}", total.writebacks);
        println!("  invalidations          {}", total.invalidations_sent);
        println!("==========================================================");
    }
}

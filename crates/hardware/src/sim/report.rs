//! Observation reporting.
//!
//! Core contexts hand every executed instruction's [`Observation`] to a shared
//! sink under the report-domain lock, and the barrier leader hands it the
//! cycle-boundary marker. It provides:
//! 1. **Sink Trait:** [`ObservationSink`], the seam between the scheduler and output.
//! 2. **Text Output:** [`TextSink`], the human-readable log format.
//! 3. **Capture:** [`EventLog`], an in-memory record for tests and tooling.

use std::io::{self, Write};

use serde::Serialize;

use crate::core::coherence::{Observation, SystemSnapshot};

/// Receiver of everything a run reports.
///
/// Calls are serialized by the scheduler; implementations need no locking of their own.
pub trait ObservationSink: Send {
    /// One executed instruction.
    fn observe(&mut self, observation: &Observation);

    /// All active cores finished cycle `cycle` (1-based).
    fn cycle_end(&mut self, cycle: u64);

    /// Full cache and memory state after an instruction, when dumps are enabled.
    fn state_dump(&mut self, _snapshot: &SystemSnapshot) {}
}

/// Writes the classic text log to any writer.
///
/// ```text
/// Core 0 Writing   to address 00: 05
/// Core 1 Reading from address 02: 00
/// Clock tick 1
/// ```
///
/// The first I/O error is kept and returned by [`TextSink::finish`]; later
/// output is dropped.
#[derive(Debug)]
pub struct TextSink<W> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write + Send> TextSink<W> {
    /// Wraps a writer.
    pub const fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Flushes and returns the writer.
    ///
    /// # Errors
    ///
    /// Returns the first write error seen during the run, or the flush error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn emit(&mut self, args: std::fmt::Arguments<'_>) {
        if self.error.is_none() {
            if let Err(err) = self.out.write_fmt(args) {
                self.error = Some(err);
            }
        }
    }
}

impl<W: Write + Send> ObservationSink for TextSink<W> {
    fn observe(&mut self, observation: &Observation) {
        self.emit(format_args!("{observation}\n"));
    }

    fn cycle_end(&mut self, cycle: u64) {
        self.emit(format_args!("Clock tick {cycle}\n"));
    }

    fn state_dump(&mut self, snapshot: &SystemSnapshot) {
        self.emit(format_args!("{snapshot}"));
    }
}

/// One entry of an [`EventLog`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ReportEvent {
    /// An executed instruction.
    Access(Observation),
    /// End-of-cycle marker.
    CycleEnd(u64),
    /// State dump.
    Dump(SystemSnapshot),
}

/// Records every reported event in order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EventLog {
    events: Vec<ReportEvent>,
}

impl EventLog {
    /// Creates an empty log.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// All events in report order.
    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    /// Every observation in report order.
    pub fn observations(&self) -> Vec<Observation> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Access(observation) => Some(*observation),
                _ => None,
            })
            .collect()
    }

    /// Observations grouped by the cycle they were reported in.
    ///
    /// Observations after the last marker form a trailing group, which is
    /// empty for a completed run and therefore omitted.
    pub fn cycles(&self) -> Vec<Vec<Observation>> {
        let mut cycles = Vec::new();
        let mut current = Vec::new();
        for event in &self.events {
            match event {
                ReportEvent::Access(observation) => current.push(*observation),
                ReportEvent::CycleEnd(_) => cycles.push(std::mem::take(&mut current)),
                ReportEvent::Dump(_) => {}
            }
        }
        if !current.is_empty() {
            cycles.push(current);
        }
        cycles
    }

    /// Every state dump in report order.
    pub fn dumps(&self) -> impl Iterator<Item = &SystemSnapshot> {
        self.events.iter().filter_map(|event| match event {
            ReportEvent::Dump(snapshot) => Some(snapshot),
            _ => None,
        })
    }
}

impl ObservationSink for EventLog {
    fn observe(&mut self, observation: &Observation) {
        self.events.push(ReportEvent::Access(*observation));
    }

    fn cycle_end(&mut self, cycle: u64) {
        self.events.push(ReportEvent::CycleEnd(cycle));
    }

    fn state_dump(&mut self, snapshot: &SystemSnapshot) {
        self.events.push(ReportEvent::Dump(snapshot.clone()));
    }
}

//! Clock Scheduler.
//!
//! This module runs one execution context per core on its own OS thread and
//! lock-steps them with a [`ClockBarrier`]. It performs:
//! 1. **Spawning:** One scoped thread named `core-<n>` per instruction source.
//! 2. **Execution:** Each context pulls an instruction, runs it through the
//!    [`CoherenceController`], and reports the observation.
//! 3. **Clocking:** All active contexts meet at the barrier after every
//!    instruction; the last arrival emits the cycle marker.
//! 4. **Termination:** Exhausted or failed contexts leave the barrier so the
//!    rest keep running; failures are recorded per core.
//!
//! # Lock order
//!
//! barrier → turn gate, barrier → report, report → cache slots → memory.
//! Contexts never hold a slot lock while reporting.

use std::collections::BTreeSet;
use std::panic;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use tracing::{debug, error, info, trace};

use crate::common::{CoreId, SimError};
use crate::config::ExecutionMode;
use crate::core::coherence::{CoherenceController, Execution};
use crate::sim::barrier::ClockBarrier;
use crate::sim::report::ObservationSink;
use crate::sim::source::InstructionSource;
use crate::stats::{CoreStats, SimStats};

/// Outcome of one core's context.
#[derive(Debug)]
pub struct CoreReport {
    /// Core id.
    pub core: CoreId,
    /// Counters for the instructions it executed.
    pub stats: CoreStats,
    /// The error that terminated the context early, if any.
    pub error: Option<SimError>,
}

impl CoreReport {
    fn new(core: CoreId) -> Self {
        Self {
            core,
            stats: CoreStats::default(),
            error: None,
        }
    }

    fn failed(core: CoreId, error: SimError) -> Self {
        let mut report = Self::new(core);
        report.error = Some(error);
        report
    }

    /// Number of instructions the context executed.
    pub const fn executed(&self) -> u64 {
        self.stats.instructions()
    }
}

/// Outcome of a whole run.
#[derive(Debug)]
pub struct RunSummary {
    /// Completed clock cycles.
    pub cycles: u64,
    /// One report per core, in core order.
    pub cores: Vec<CoreReport>,
}

impl RunSummary {
    /// Collects the statistics of every core.
    pub fn stats(&self) -> SimStats {
        SimStats {
            cycles: self.cycles,
            cores: self.cores.iter().map(|report| report.stats).collect(),
        }
    }

    /// Every per-core error, in core order.
    pub fn errors(&self) -> impl Iterator<Item = &SimError> {
        self.cores.iter().filter_map(|report| report.error.as_ref())
    }

    /// Returns `true` if every context ran to the end of its stream.
    pub fn is_clean(&self) -> bool {
        self.errors().next().is_none()
    }
}

#[derive(Debug)]
struct GateState {
    active: BTreeSet<CoreId>,
    current: Option<CoreId>,
}

/// Turn token for [`ExecutionMode::Serialized`].
///
/// Within a cycle the token visits active cores in ascending id order; the
/// barrier leader rewinds it to the lowest active core.
#[derive(Debug)]
struct TurnGate {
    state: Mutex<GateState>,
    turn: Condvar,
}

impl TurnGate {
    fn new(cores: impl IntoIterator<Item = CoreId>) -> Self {
        let active: BTreeSet<CoreId> = cores.into_iter().collect();
        let current = active.first().copied();
        Self {
            state: Mutex::new(GateState { active, current }),
            turn: Condvar::new(),
        }
    }

    fn acquire(&self, core: CoreId) {
        let mut state = self.lock();
        while state.current != Some(core) {
            state = self.turn.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn pass(&self, core: CoreId) {
        let mut state = self.lock();
        state.current = state.active.range(core + 1..).next().copied();
        self.turn.notify_all();
    }

    fn depart(&self, core: CoreId) {
        let mut state = self.lock();
        let _ = state.active.remove(&core);
        if state.current == Some(core) {
            state.current = state.active.range(core + 1..).next().copied();
        }
        self.turn.notify_all();
    }

    fn rewind(&self) {
        let mut state = self.lock();
        state.current = state.active.first().copied();
        self.turn.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// State shared by every context of one run.
struct RunState<'a, K> {
    controller: &'a CoherenceController,
    barrier: ClockBarrier,
    gate: Option<TurnGate>,
    sink: Mutex<&'a mut K>,
    dump_state: bool,
}

impl<'a, K: ObservationSink> RunState<'a, K> {
    fn sink(&self) -> MutexGuard<'_, &'a mut K> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn end_cycle(&self, cycle: u64) {
        if let Some(gate) = &self.gate {
            gate.rewind();
        }
        debug!(cycle, "clock tick");
        self.sink().cycle_end(cycle);
    }

    fn report(&self, execution: &Execution) {
        let mut sink = self.sink();
        sink.observe(&execution.observation);
        if self.dump_state {
            sink.state_dump(&self.controller.snapshot());
        }
    }

    fn depart(&self, core: CoreId) {
        if let Some(gate) = &self.gate {
            gate.depart(core);
        }
        self.barrier.leave(|cycle| self.end_cycle(cycle));
        debug!(core, remaining = self.barrier.active(), "context left the barrier");
    }
}

/// Removes a context from the gate and barrier when it ends, including by panic.
struct Departure<'s, 'a, K: ObservationSink> {
    state: &'s RunState<'a, K>,
    core: CoreId,
}

impl<K: ObservationSink> Drop for Departure<'_, '_, K> {
    fn drop(&mut self) {
        self.state.depart(self.core);
    }
}

/// Drives a set of per-core instruction streams against one controller.
#[derive(Debug)]
pub struct ClockScheduler<'a> {
    controller: &'a CoherenceController,
    mode: ExecutionMode,
    dump_state: bool,
}

impl<'a> ClockScheduler<'a> {
    /// Creates a scheduler for `controller`.
    ///
    /// # Arguments
    ///
    /// * `controller` - The coherence controller every context executes against.
    /// * `mode` - How contexts are ordered within a cycle.
    pub const fn new(controller: &'a CoherenceController, mode: ExecutionMode) -> Self {
        Self {
            controller,
            mode,
            dump_state: false,
        }
    }

    /// Enables a state dump after every executed instruction.
    #[must_use]
    pub const fn with_dump_state(mut self, dump_state: bool) -> Self {
        self.dump_state = dump_state;
        self
    }

    /// Runs every stream to completion; stream `i` belongs to core `i`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if there are more streams than cores.
    /// Per-core failures do not fail the run; they are reported in the
    /// returned [`RunSummary`].
    pub fn run<S, K>(&self, sources: Vec<S>, sink: &mut K) -> Result<RunSummary, SimError>
    where
        S: InstructionSource,
        K: ObservationSink,
    {
        self.run_loaded(sources.into_iter().map(Ok).collect(), sink)
    }

    /// Runs streams that may have failed to open.
    ///
    /// A core whose entry is `Err` takes no part in the run; its error is
    /// recorded in its [`CoreReport`].
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if there are more streams than cores.
    pub fn run_loaded<S, K>(
        &self,
        sources: Vec<Result<S, SimError>>,
        sink: &mut K,
    ) -> Result<RunSummary, SimError>
    where
        S: InstructionSource,
        K: ObservationSink,
    {
        let num_cores = self.controller.num_cores();
        if sources.len() > num_cores {
            return Err(SimError::InvalidConfig(format!(
                "{} instruction streams for {num_cores} cores",
                sources.len()
            )));
        }

        let mut reports = Vec::with_capacity(sources.len());
        let mut runnable = Vec::with_capacity(sources.len());
        for (core, source) in sources.into_iter().enumerate() {
            match source {
                Ok(source) => runnable.push((core, source)),
                Err(err) => {
                    error!(core, error = %err, "core excluded from run");
                    reports.push(CoreReport::failed(core, err));
                }
            }
        }

        let gate = match self.mode {
            ExecutionMode::Interleaved => None,
            ExecutionMode::Serialized => Some(TurnGate::new(runnable.iter().map(|(core, _)| *core))),
        };
        let state = RunState {
            controller: self.controller,
            barrier: ClockBarrier::new(runnable.len()),
            gate,
            sink: Mutex::new(sink),
            dump_state: self.dump_state,
        };

        info!(cores = runnable.len(), mode = ?self.mode, "run started");
        let finished = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(runnable.len());
            let mut failed = Vec::new();
            for (core, source) in runnable {
                let state = &state;
                let spawned = thread::Builder::new()
                    .name(format!("core-{core}"))
                    .spawn_scoped(scope, move || run_context(state, core, source));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(source) => {
                        let err = SimError::Spawn { core, source };
                        error!(core, error = %err, "core excluded from run");
                        state.depart(core);
                        failed.push(CoreReport::failed(core, err));
                    }
                }
            }
            let mut finished: Vec<CoreReport> = handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
                .collect();
            finished.append(&mut failed);
            finished
        });

        reports.extend(finished);
        reports.sort_by_key(|report| report.core);
        let cycles = state.barrier.cycles();
        info!(cycles, "run finished");
        Ok(RunSummary {
            cycles,
            cores: reports,
        })
    }
}

/// Body of one core's execution context.
fn run_context<S, K>(state: &RunState<'_, K>, core: CoreId, mut source: S) -> CoreReport
where
    S: InstructionSource,
    K: ObservationSink,
{
    let _departure = Departure { state, core };
    let mut report = CoreReport::new(core);
    debug!(core, "context started");

    loop {
        if let Some(gate) = &state.gate {
            gate.acquire(core);
        }
        let instruction = match source.next_instruction() {
            None => break,
            Some(Ok(instruction)) => instruction,
            Some(Err(err)) => {
                error!(core, error = %err, "instruction stream aborted");
                report.error = Some(err);
                break;
            }
        };
        match state.controller.execute(core, instruction) {
            Ok(execution) => {
                trace!(core, %instruction, state = %execution.state, "executed");
                report.stats.record(&execution);
                state.report(&execution);
            }
            Err(err) => {
                error!(core, line = source.position(), %instruction, error = %err, "instruction failed");
                report.error = Some(err);
                break;
            }
        }
        if let Some(gate) = &state.gate {
            gate.pass(core);
        }
        let _ = state.barrier.wait(|cycle| state.end_cycle(cycle));
    }

    debug!(core, executed = report.executed(), "context finished");
    report
}

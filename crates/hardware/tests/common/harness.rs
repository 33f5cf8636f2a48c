use mesisim_core::CoherenceController;
use mesisim_core::config::{ExecutionMode, SystemConfig};
use mesisim_core::isa::decode::decode_program;
use mesisim_core::sim::{ClockScheduler, EventLog, ProgramSource, RunSummary};
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Builds a controller with the given dimensions.
pub fn system(num_cores: usize, cache_slots: usize, memory_size: usize) -> CoherenceController {
    init_tracing();
    CoherenceController::new(&SystemConfig {
        num_cores,
        cache_slots,
        memory_size,
        initial_memory: Vec::new(),
    })
    .unwrap()
}

/// Decodes a multi-line program into a source, panicking on malformed text.
pub fn program(text: &str) -> ProgramSource {
    ProgramSource::new(decode_program(text).unwrap())
}

/// Result of [`run`]: the summary plus everything the sink saw.
pub struct TestRun {
    pub summary: RunSummary,
    pub log: EventLog,
}

/// Runs one program per core and captures the event log.
pub fn run(controller: &CoherenceController, mode: ExecutionMode, programs: &[&str]) -> TestRun {
    run_with_dumps(controller, mode, programs, false)
}

/// Like [`run`], optionally recording a state dump after every instruction.
pub fn run_with_dumps(
    controller: &CoherenceController,
    mode: ExecutionMode,
    programs: &[&str],
    dump_state: bool,
) -> TestRun {
    let sources: Vec<ProgramSource> = programs.iter().map(|text| program(text)).collect();
    let mut log = EventLog::new();
    let summary = ClockScheduler::new(controller, mode)
        .with_dump_state(dump_state)
        .run(sources, &mut log)
        .unwrap();
    TestRun { summary, log }
}

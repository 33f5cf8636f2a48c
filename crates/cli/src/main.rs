//! MESI cache-coherence simulator CLI.
//!
//! This binary provides a single entry point for the simulator. It performs:
//! 1. **Run:** Load one instruction file per core, run every core in lock-step,
//!    print the observation log, and report statistics as text or JSON.
//! 2. **Decode:** Validate an instruction file and print it in canonical form.

use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mesisim_core::config::{Config, ExecutionMode};
use mesisim_core::core::CoherenceController;
use mesisim_core::isa::decode;
use mesisim_core::sim::loader;
use mesisim_core::sim::{ClockScheduler, RunSummary, TextSink};
use mesisim_core::stats::SimStats;

#[derive(Parser, Debug)]
#[command(
    name = "mesisim",
    author,
    version,
    about = "Multi-core MESI cache-coherence simulator",
    long_about = "Run one instruction stream per core against private direct-mapped caches kept coherent with MESI.\n\nInstruction files hold one `RD <addr>` or `WR <addr> <value>` per line.\n\nExamples:\n  mesisim run --input-dir programs\n  mesisim run core_0.txt core_1.txt --mode serialized --stats json\n  mesisim decode core_0.txt"
)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the simulator over per-core instruction files.
    Run(RunArgs),

    /// Decode an instruction file and print it back.
    Decode {
        /// Instruction file to check.
        file: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// JSON configuration file; flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of cores (defaults to the number of FILEs when given).
    #[arg(long)]
    cores: Option<usize>,

    /// Direct-mapped slots per core cache.
    #[arg(long)]
    slots: Option<usize>,

    /// Shared memory size in bytes.
    #[arg(long)]
    memory: Option<usize>,

    /// How cores are ordered within a clock cycle.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Print the full cache and memory state after every instruction.
    #[arg(long)]
    dump_state: bool,

    /// Statistics output format.
    #[arg(long, value_enum, default_value_t = StatsFormat::Text)]
    stats: StatsFormat,

    /// Directory holding `core_<n>.txt` for every core.
    #[arg(short, long, conflicts_with = "files")]
    input_dir: Option<PathBuf>,

    /// One instruction file per core, in core order.
    #[arg(required_unless_present = "input_dir")]
    files: Vec<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Interleaved,
    Serialized,
}

impl From<ModeArg> for ExecutionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Interleaved => Self::Interleaved,
            ModeArg::Serialized => Self::Serialized,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StatsFormat {
    Text,
    Json,
    None,
}

/// Machine-readable run result for `--stats json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    stats: &'a SimStats,
    errors: Vec<JsonError>,
}

#[derive(Serialize)]
struct JsonError {
    core: Option<usize>,
    message: String,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run(args) => cmd_run(&args),
        Commands::Decode { file } => cmd_decode(&file),
    }
}

/// Installs the `tracing` subscriber; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_thread_names(true)
        .init();
}

/// Builds the configuration: JSON file first, then flag overrides.
fn build_config(args: &RunArgs) -> Config {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config {}: {}", path.display(), e);
                process::exit(1);
            });
            Config::from_json(&text).unwrap_or_else(|e| {
                eprintln!("Error in config {}: {}", path.display(), e);
                process::exit(1);
            })
        }
        None => Config::default(),
    };

    if let Some(cores) = args.cores {
        config.system.num_cores = cores;
    } else if !args.files.is_empty() {
        config.system.num_cores = args.files.len();
    }
    if let Some(slots) = args.slots {
        config.system.cache_slots = slots;
    }
    if let Some(memory) = args.memory {
        config.system.memory_size = memory;
    }
    if let Some(mode) = args.mode {
        config.general.execution_mode = mode.into();
    }
    config.general.dump_state |= args.dump_state;

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    config
}

/// Runs the simulator and exits with code 1 if any core failed.
fn cmd_run(args: &RunArgs) {
    let config = build_config(args);
    info!(
        cores = config.system.num_cores,
        slots = config.system.cache_slots,
        memory = config.system.memory_size,
        mode = ?config.general.execution_mode,
        "configuration"
    );
    let controller = CoherenceController::new(&config.system).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    let sources = match &args.input_dir {
        Some(dir) => loader::open_dir(dir, config.system.num_cores),
        None => loader::open_sources(&args.files),
    };

    let mut sink = TextSink::new(BufWriter::new(io::stdout()));
    let scheduler = ClockScheduler::new(&controller, config.general.execution_mode)
        .with_dump_state(config.general.dump_state);
    let summary = scheduler.run_loaded(sources, &mut sink).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });
    if let Err(e) = sink.finish() {
        eprintln!("Error writing output: {e}");
        process::exit(1);
    }

    report(&summary, args.stats);
    if !summary.is_clean() {
        process::exit(1);
    }
}

/// Prints per-core errors to stderr and statistics in the requested format.
fn report(summary: &RunSummary, format: StatsFormat) {
    for err in summary.errors() {
        eprintln!("[!] {err}");
    }

    let stats = summary.stats();
    match format {
        StatsFormat::Text => stats.print(),
        StatsFormat::Json => {
            let report = JsonReport {
                stats: &stats,
                errors: summary
                    .errors()
                    .map(|e| JsonError {
                        core: e.core(),
                        message: e.to_string(),
                    })
                    .collect(),
            };
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error encoding statistics: {e}");
                    process::exit(1);
                }
            }
        }
        StatsFormat::None => {}
    }
}

/// Decodes `path` and prints each instruction, or the first error with its line.
fn cmd_decode(path: &Path) {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path.display(), e);
        process::exit(1);
    });
    match decode::decode_program(&text) {
        Ok(program) => {
            for instruction in &program {
                println!("{instruction}");
            }
        }
        Err((line, e)) => {
            eprintln!("{}:{}: {}", path.display(), line, e);
            process::exit(1);
        }
    }
}

//! Simulator error definitions.
//!
//! This module defines the error handling for the simulator. It provides:
//! 1. **Decode Errors:** Why a single instruction line could not be decoded.
//! 2. **Simulator Errors:** Failures that abort a core's stream or reject a configuration.
//! 3. **Error Traits:** Integration with `std::error::Error` via `thiserror` for system-level reporting.
//!
//! Protocol-invariant violations are not represented here; they are programming defects
//! reported by [`SystemSnapshot::check_coherence`](crate::core::coherence::SystemSnapshot::check_coherence).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::addr::Address;
use super::data::CoreId;

/// Reason a single instruction line failed to decode.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The line contained no opcode.
    #[error("empty instruction")]
    Empty,

    /// The opcode is neither `RD` nor `WR`.
    #[error("unrecognized opcode `{0}`")]
    UnknownOpcode(String),

    /// A required operand is absent.
    #[error("`{opcode}` is missing its {operand} operand")]
    MissingOperand {
        /// Opcode being decoded.
        opcode: &'static str,
        /// Name of the missing operand (`address` or `value`).
        operand: &'static str,
    },

    /// An operand is not a decimal integer in byte range.
    #[error("{operand} `{text}` is not a decimal byte (0-255)")]
    InvalidOperand {
        /// Name of the offending operand.
        operand: &'static str,
        /// Raw operand text.
        text: String,
    },

    /// The line carries more operands than the opcode takes.
    #[error("unexpected trailing operand `{0}`")]
    UnexpectedOperand(String),
}

/// Crate-wide simulator error.
#[derive(Debug, Error)]
pub enum SimError {
    /// A malformed instruction line; aborts that core's stream.
    #[error("core {core}, line {line}: {source}")]
    Parse {
        /// Core whose stream contained the line.
        core: CoreId,
        /// 1-based line number within the stream.
        line: usize,
        /// Underlying decode failure.
        #[source]
        source: DecodeError,
    },

    /// An address at or beyond the end of shared memory.
    #[error("address {address} out of bounds for memory of {size} bytes")]
    OutOfBounds {
        /// Offending address.
        address: Address,
        /// Size of shared memory in bytes.
        size: usize,
    },

    /// A core's instruction stream could not be obtained at startup.
    #[error("core {core}: cannot open instruction stream {}: {source}", path.display())]
    MissingSource {
        /// Core the stream belongs to.
        core: CoreId,
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A core id outside `[0, num_cores)`.
    #[error("core {core} does not exist (system has {num_cores} cores)")]
    UnknownCore {
        /// Requested core.
        core: CoreId,
        /// Configured number of cores.
        num_cores: usize,
    },

    /// I/O failure while reading an already-open stream.
    #[error("core {core}, line {line}: read failed: {source}")]
    Read {
        /// Core whose stream failed.
        core: CoreId,
        /// 1-based line number being read.
        line: usize,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A configuration value that cannot describe a runnable system.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document that is not valid JSON for [`Config`](crate::config::Config).
    #[error("malformed configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    /// The host refused to start a core's thread.
    #[error("core {core}: failed to spawn thread: {source}")]
    Spawn {
        /// Core whose thread failed to start.
        core: CoreId,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl SimError {
    /// Returns the core this error is attributed to, if any.
    pub const fn core(&self) -> Option<CoreId> {
        match self {
            Self::Parse { core, .. }
            | Self::MissingSource { core, .. }
            | Self::UnknownCore { core, .. }
            | Self::Read { core, .. }
            | Self::Spawn { core, .. } => Some(*core),
            Self::OutOfBounds { .. } | Self::InvalidConfig(_) | Self::ConfigFormat(_) => None,
        }
    }
}

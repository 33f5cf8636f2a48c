//! Decoded instruction representation.
//!
//! Each core executes a private stream of byte reads and writes. This module
//! defines the decoded form of one stream entry and its textual encoding.

use std::fmt;
use std::str::FromStr;

use crate::common::{AccessKind, Address, DecodeError, Value};
use crate::isa::decode;

/// Mnemonic for a read instruction.
pub const OP_READ: &str = "RD";
/// Mnemonic for a write instruction.
pub const OP_WRITE: &str = "WR";

/// A single decoded memory instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// `RD <address>`: load one byte through the core's cache.
    Read {
        /// Target address.
        address: Address,
    },
    /// `WR <address> <value>`: store one byte through the core's cache.
    Write {
        /// Target address.
        address: Address,
        /// Byte to store.
        value: Value,
    },
}

impl Instruction {
    /// Builds a read of `address`.
    pub const fn read(address: usize) -> Self {
        Self::Read {
            address: Address::new(address),
        }
    }

    /// Builds a write of `value` to `address`.
    pub const fn write(address: usize, value: Value) -> Self {
        Self::Write {
            address: Address::new(address),
            value,
        }
    }

    /// Returns whether this instruction reads or writes.
    pub const fn kind(&self) -> AccessKind {
        match self {
            Self::Read { .. } => AccessKind::Read,
            Self::Write { .. } => AccessKind::Write,
        }
    }

    /// Returns the target address.
    pub const fn address(&self) -> Address {
        match self {
            Self::Read { address } | Self::Write { address, .. } => *address,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { address } => write!(f, "{OP_READ} {}", address.val()),
            Self::Write { address, value } => write!(f, "{OP_WRITE} {} {value}", address.val()),
        }
    }
}

impl FromStr for Instruction {
    type Err = DecodeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        decode::decode_line(line)?.ok_or(DecodeError::Empty)
    }
}

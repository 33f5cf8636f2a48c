//! Instruction Set Definitions.
//!
//! Contains the decoded instruction type and the line decoder for the per-core
//! instruction stream format (`RD <address>` / `WR <address> <value>`).

/// Instruction line decoding.
pub mod decode;

/// Decoded instruction representation and mnemonics.
pub mod instruction;

pub use instruction::Instruction;

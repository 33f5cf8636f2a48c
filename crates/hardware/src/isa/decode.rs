//! Instruction Line Decoder.
//!
//! This module decodes the textual per-core instruction format into [`Instruction`]
//! values. One instruction per line, whitespace-separated decimal fields:
//!
//! ```text
//! RD <address>
//! WR <address> <value>
//! ```
//!
//! Both operands must fit in a byte. Blank lines decode to `None`.

use std::str::SplitWhitespace;

use crate::common::{Address, DecodeError, Value};
use crate::isa::instruction::{Instruction, OP_READ, OP_WRITE};

/// Decodes one instruction line.
///
/// # Arguments
///
/// * `line` - Raw line text, with or without its trailing newline.
///
/// # Returns
///
/// `Ok(None)` for a blank line, `Ok(Some(instruction))` for a well-formed one.
///
/// # Errors
///
/// Returns a [`DecodeError`] for an unknown opcode, a missing or malformed operand,
/// or trailing garbage after the last operand.
pub fn decode_line(line: &str) -> Result<Option<Instruction>, DecodeError> {
    let mut fields = line.split_whitespace();
    let Some(opcode) = fields.next() else {
        return Ok(None);
    };

    let inst = match opcode {
        OP_READ => {
            let address = operand(&mut fields, OP_READ, "address")?;
            Instruction::Read {
                address: Address::from(address),
            }
        }
        OP_WRITE => {
            let address = operand(&mut fields, OP_WRITE, "address")?;
            let value = operand(&mut fields, OP_WRITE, "value")?;
            Instruction::Write {
                address: Address::from(address),
                value,
            }
        }
        other => return Err(DecodeError::UnknownOpcode(other.to_string())),
    };

    match fields.next() {
        Some(extra) => Err(DecodeError::UnexpectedOperand(extra.to_string())),
        None => Ok(Some(inst)),
    }
}

/// Decodes a whole program, skipping blank lines.
///
/// # Errors
///
/// Returns the 1-based line number and decode error of the first bad line.
pub fn decode_program(text: &str) -> Result<Vec<Instruction>, (usize, DecodeError)> {
    let mut program = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if let Some(inst) = decode_line(line).map_err(|e| (idx + 1, e))? {
            program.push(inst);
        }
    }
    Ok(program)
}

/// Pulls the next field and parses it as a decimal byte.
fn operand(
    fields: &mut SplitWhitespace<'_>,
    opcode: &'static str,
    name: &'static str,
) -> Result<Value, DecodeError> {
    let text = fields.next().ok_or(DecodeError::MissingOperand {
        opcode,
        operand: name,
    })?;
    // `u8::from_str` accepts a leading '+'; the file format does not.
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::InvalidOperand {
            operand: name,
            text: text.to_string(),
        });
    }
    text.parse().map_err(|_| DecodeError::InvalidOperand {
        operand: name,
        text: text.to_string(),
    })
}

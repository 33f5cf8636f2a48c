//! Instruction sources.
//!
//! Every core consumes a private, finite, ordered stream of instructions. The
//! stream is pulled one instruction at a time and cannot be rewound.

use std::collections::VecDeque;
use std::io::BufRead;

use crate::common::{CoreId, SimError};
use crate::isa::Instruction;
use crate::isa::decode::decode_line;

/// A per-core instruction stream.
pub trait InstructionSource: Send {
    /// Returns the next instruction, an error that aborts the stream, or `None` when exhausted.
    fn next_instruction(&mut self) -> Option<Result<Instruction, SimError>>;

    /// 1-based position of the last item returned, for diagnostics.
    fn position(&self) -> usize;
}

/// Lazily decodes `RD`/`WR` lines from a reader.
///
/// Blank lines are skipped. After the first error the source reports exhaustion.
#[derive(Debug)]
pub struct TextSource<R> {
    core: CoreId,
    reader: R,
    line: usize,
    buf: String,
    done: bool,
}

impl<R: BufRead + Send> TextSource<R> {
    /// Wraps `reader` as the stream of `core`.
    ///
    /// # Arguments
    ///
    /// * `core` - Core the stream belongs to; used in error reports.
    /// * `reader` - Line-oriented input.
    pub const fn new(core: CoreId, reader: R) -> Self {
        Self {
            core,
            reader,
            line: 0,
            buf: String::new(),
            done: false,
        }
    }
}

impl<R: BufRead + Send> InstructionSource for TextSource<R> {
    fn next_instruction(&mut self) -> Option<Result<Instruction, SimError>> {
        while !self.done {
            self.buf.clear();
            self.line += 1;
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => match decode_line(&self.buf) {
                    Ok(Some(instruction)) => return Some(Ok(instruction)),
                    Ok(None) => {}
                    Err(source) => {
                        self.done = true;
                        return Some(Err(SimError::Parse {
                            core: self.core,
                            line: self.line,
                            source,
                        }));
                    }
                },
                Err(source) => {
                    self.done = true;
                    return Some(Err(SimError::Read {
                        core: self.core,
                        line: self.line,
                        source,
                    }));
                }
            }
        }
        None
    }

    fn position(&self) -> usize {
        self.line
    }
}

/// An in-memory instruction list.
#[derive(Clone, Debug, Default)]
pub struct ProgramSource {
    queue: VecDeque<Instruction>,
    taken: usize,
}

impl ProgramSource {
    /// Creates a source that yields `program` in order.
    pub fn new(program: impl IntoIterator<Item = Instruction>) -> Self {
        Self {
            queue: program.into_iter().collect(),
            taken: 0,
        }
    }
}

impl InstructionSource for ProgramSource {
    fn next_instruction(&mut self) -> Option<Result<Instruction, SimError>> {
        let instruction = self.queue.pop_front()?;
        self.taken += 1;
        Some(Ok(instruction))
    }

    fn position(&self) -> usize {
        self.taken
    }
}

impl<S: InstructionSource + ?Sized> InstructionSource for Box<S> {
    fn next_instruction(&mut self) -> Option<Result<Instruction, SimError>> {
        (**self).next_instruction()
    }

    fn position(&self) -> usize {
        (**self).position()
    }
}

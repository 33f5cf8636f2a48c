//! MESI line state machine.
//!
//! Encodes the per-line transition table of the protocol. The controller feeds
//! every local action and every snoop through [`MesiState::next`], so the legal
//! transitions live in one place.
//!
//! <pre>
//!                  M   E   S   I      (may coexist on other cores)
//!   Modified       ✗   ✗   ✗   ✓
//!   Exclusive      ✗   ✗   ✗   ✓
//!   Shared         ✗   ✗   ✓   ✓
//!   Invalid        ✓   ✓   ✓   ✓
//! </pre>

use std::fmt;

use serde::Serialize;

/// Coherence state of one cache line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum MesiState {
    /// No valid data.
    #[default]
    Invalid,
    /// Valid, possibly held by other cores too; memory is current.
    Shared,
    /// Valid, held only here; memory is current.
    Exclusive,
    /// Valid, held only here; memory is stale.
    Modified,
}

/// Events that drive a line from one state to the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineEvent {
    /// The owning core read an address the line already holds.
    LocalReadHit,
    /// A read miss was satisfied from memory (no other valid copy).
    FillFromMemory,
    /// A read miss was satisfied by a peer's copy.
    FillFromPeer,
    /// The owning core wrote the line.
    LocalWrite,
    /// Another core read-missed on the address this line holds.
    SnoopRead,
    /// Another core wrote the address this line holds.
    SnoopWrite,
    /// The line was reassigned to a different address.
    Evict,
}

impl MesiState {
    /// Returns the state after `event`.
    pub const fn next(self, event: LineEvent) -> Self {
        match event {
            LineEvent::LocalReadHit => self,
            LineEvent::FillFromMemory => Self::Exclusive,
            LineEvent::FillFromPeer => Self::Shared,
            LineEvent::LocalWrite => Self::Modified,
            LineEvent::SnoopRead => match self {
                Self::Invalid => Self::Invalid,
                Self::Shared | Self::Exclusive | Self::Modified => Self::Shared,
            },
            LineEvent::SnoopWrite | LineEvent::Evict => Self::Invalid,
        }
    }

    /// Returns `true` for every state except `Invalid`.
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Returns `true` if memory may be stale for this line's address.
    pub const fn is_dirty(self) -> bool {
        matches!(self, Self::Modified)
    }

    /// Returns `true` if an eviction must flush this line to memory.
    ///
    /// Shared lines are flushed as well as Modified ones; Exclusive and Invalid
    /// lines are dropped silently.
    pub const fn flushes_on_evict(self) -> bool {
        matches!(self, Self::Modified | Self::Shared)
    }
}

impl fmt::Display for MesiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invalid => "Invalid",
            Self::Shared => "Shared",
            Self::Exclusive => "Exclusive",
            Self::Modified => "Modified",
        };
        f.pad(name)
    }
}

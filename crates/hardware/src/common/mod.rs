//! Common utilities and types used throughout the coherence simulator.
//!
//! This module provides fundamental building blocks that are shared across all components
//! of the simulator. It includes:
//! 1. **Address Types:** A strong type for shared-memory byte addresses.
//! 2. **Memory Access:** Access kinds plus the `Value` and `CoreId` aliases.
//! 3. **Error Handling:** Decode and simulator error types.

/// Address type definition.
pub mod addr;

/// Memory access type definitions.
pub mod data;

/// Error types.
pub mod error;

pub use addr::Address;
pub use data::{AccessKind, CoreId, Value};
pub use error::{DecodeError, SimError};

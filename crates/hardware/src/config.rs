//! Configuration system for the coherence simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline system constants (core count, cache slots, memory size).
//! 2. **Structures:** Hierarchical config for general settings and the simulated system.
//! 3. **Enums:** Execution mode selection (interleaved or serialized cores).
//! 4. **Validation:** Rejects configurations that cannot describe a runnable system.
//!
//! Configuration is construction-time only. It is supplied as JSON (`Config::from_json`),
//! built with `Config::default()`, or assembled by the CLI from flags.

use serde::Deserialize;

use crate::common::{SimError, Value};

/// Default configuration constants for the simulator.
///
/// These values reproduce the classic two-core teaching setup when not
/// explicitly overridden.
mod defaults {
    /// Number of simulated cores.
    pub const NUM_CORES: usize = 2;

    /// Direct-mapped slots per core cache.
    pub const CACHE_SLOTS: usize = 2;

    /// Size of shared memory in bytes.
    pub const MEMORY_SIZE: usize = 24;
}

/// How cores are interleaved within a clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ExecutionMode {
    /// Cores race freely within a cycle; only the end-of-cycle barrier orders them.
    #[default]
    #[serde(alias = "interleaved")]
    Interleaved,
    /// Cores take turns in ascending id order within each cycle.
    ///
    /// Produces a deterministic observation order; useful for debugging traces.
    #[serde(alias = "serialized")]
    Serialized,
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use mesisim_core::config::{Config, ExecutionMode};
///
/// let json = r#"{
///     "general": { "execution_mode": "Serialized" },
///     "system": { "num_cores": 4, "cache_slots": 8 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.general.execution_mode, ExecutionMode::Serialized);
/// assert_eq!(config.system.num_cores, 4);
/// assert_eq!(config.system.memory_size, 24);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Simulated system dimensions
    #[serde(default)]
    pub system: SystemConfig,
}

impl Config {
    /// Parses and validates a JSON configuration document.
    ///
    /// Missing sections and fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ConfigFormat`] for malformed JSON and
    /// [`SimError::InvalidConfig`] for values that fail [`Config::validate`].
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration describes a runnable system.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), SimError> {
        self.system.validate()
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Interleaving policy for cores within a cycle
    #[serde(default)]
    pub execution_mode: ExecutionMode,

    /// Report a full cache/memory dump after every executed instruction
    #[serde(default)]
    pub dump_state: bool,
}

/// Dimensions of the simulated multiprocessor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SystemConfig {
    /// Number of cores (one execution context and one private cache each)
    #[serde(default = "SystemConfig::default_num_cores")]
    pub num_cores: usize,

    /// Direct-mapped slots per core cache
    #[serde(default = "SystemConfig::default_cache_slots")]
    pub cache_slots: usize,

    /// Size of shared memory in bytes
    #[serde(default = "SystemConfig::default_memory_size")]
    pub memory_size: usize,

    /// Bytes copied into memory from address 0 before the run; the rest stays zero
    #[serde(default)]
    pub initial_memory: Vec<Value>,
}

impl SystemConfig {
    /// Returns the default number of cores.
    const fn default_num_cores() -> usize {
        defaults::NUM_CORES
    }

    /// Returns the default number of cache slots per core.
    const fn default_cache_slots() -> usize {
        defaults::CACHE_SLOTS
    }

    /// Returns the default shared memory size in bytes.
    const fn default_memory_size() -> usize {
        defaults::MEMORY_SIZE
    }

    /// Checks that every dimension is non-zero and the initial image fits.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] naming the first zero dimension, or
    /// when `initial_memory` is longer than `memory_size`.
    pub fn validate(&self) -> Result<(), SimError> {
        let fields = [
            ("num_cores", self.num_cores),
            ("cache_slots", self.cache_slots),
            ("memory_size", self.memory_size),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(SimError::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        if self.initial_memory.len() > self.memory_size {
            return Err(SimError::InvalidConfig(format!(
                "initial_memory holds {} bytes but memory_size is {}",
                self.initial_memory.len(),
                self.memory_size
            )));
        }
        Ok(())
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            num_cores: defaults::NUM_CORES,
            cache_slots: defaults::CACHE_SLOTS,
            memory_size: defaults::MEMORY_SIZE,
            initial_memory: Vec::new(),
        }
    }
}

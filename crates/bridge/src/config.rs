//! Configuration system for the bridge.
//!
//! This module defines all configuration structures and enums used to parameterize
//! a bridge run. It provides:
//! 1. **Defaults:** Baseline constants (clock, cycle limit, line size, bus width, latencies).
//! 2. **Structures:** Hierarchical config for general, bridge, and memory settings.
//! 3. **Enums:** Memory-manager and memory-interface selection.
//! 4. **Validation:** Checks that sizes are powers of two and mutually consistent.
//!
//! Configuration is supplied as JSON (see [`Config::from_json`]) or built with `Config::default()`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Default configuration constants for the bridge.
mod defaults {
    /// Clock frequency of the RTL model.
    pub const CLOCK: &str = "1GHz";

    /// Number of ticks a run executes at most before halting.
    pub const MAX_CYCLES: u64 = 1000;

    /// Cycles reset is held asserted at the start of a run.
    pub const RESET_CYCLES: u64 = 1;

    /// Alignment granularity used to split requests (64 bytes).
    pub const CACHE_LINE: u64 = 64;

    /// Width of the AXI data channels in bytes (8 bytes = 64-bit bus).
    pub const BUS_WIDTH: u64 = 8;

    /// Page size of the paged memory manager (4 KiB).
    pub const PAGE_SIZE: u64 = 4096;

    /// First physical frame handed out by demand paging (2 GiB).
    pub const FRAME_BASE: u64 = 0x8000_0000;

    /// Fixed latency of the simple memory controller in cycles.
    pub const LATENCY: u64 = 10;

    /// CAS latency in cycles.
    pub const T_CAS: u64 = 14;

    /// RAS latency in cycles.
    pub const T_RAS: u64 = 14;

    /// Precharge latency in cycles.
    pub const T_PRE: u64 = 14;

    /// DRAM row size in bytes.
    pub const ROW_BYTES: u64 = 2048;
}

/// Largest accepted data-bus width in bytes; write strobes are carried in a `u128`.
const MAX_BUS_WIDTH: u64 = 128;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid JSON for [`Config`].
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    /// `bridge.cache_line_size` is zero or not a power of two.
    #[error("cache line size {0} is not a power of two")]
    InvalidLineSize(u64),

    /// `bridge.bus_width_bytes` is not a power of two in `1..=128`.
    #[error("bus width {0} must be a power of two no larger than 128")]
    InvalidBusWidth(u64),

    /// `memory.page_size` is not a power of two at least one cache line long.
    #[error("page size {page} must be a power of two of at least one cache line ({line})")]
    InvalidPageSize {
        /// Configured page size.
        page: u64,
        /// Configured cache line size.
        line: u64,
    },

    /// `general.clock` could not be parsed as a frequency.
    #[error("invalid clock frequency {0:?}")]
    InvalidFrequency(String),
}

/// Memory-manager implementation selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ManagerKind {
    /// Physical address equals virtual address.
    #[default]
    Identity,
    /// Page-table translation.
    Paged,
}

/// Latency model of the memory interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum InterfaceKind {
    /// Fixed latency for every request.
    #[default]
    Simple,
    /// Row-buffer DRAM timing.
    #[serde(alias = "DRAM")]
    Dram,
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use rtlbridge_core::config::{Config, InterfaceKind, ManagerKind};
///
/// let json = r#"{
///     "general": { "clock": "500MHz", "max_cycles": 20000 },
///     "bridge": { "cache_line_size": 32 },
///     "memory": { "manager": "Paged", "demand_paging": true, "interface": "Dram" }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.general.clock_hz().unwrap(), 500_000_000);
/// assert_eq!(config.bridge.cache_line_size, 32);
/// assert_eq!(config.bridge.bus_width_bytes, 8);
/// assert_eq!(config.memory.manager, ManagerKind::Paged);
/// assert_eq!(config.memory.interface, InterfaceKind::Dram);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General run settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Protocol engine settings
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Memory collaborators
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed input, or a validation error.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as [`Config::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let line = self.bridge.cache_line_size;
        if !line.is_power_of_two() {
            return Err(ConfigError::InvalidLineSize(line));
        }
        let width = self.bridge.bus_width_bytes;
        if !width.is_power_of_two() || width > MAX_BUS_WIDTH {
            return Err(ConfigError::InvalidBusWidth(width));
        }
        let page = self.memory.page_size;
        if self.memory.manager == ManagerKind::Paged && (!page.is_power_of_two() || page < line) {
            return Err(ConfigError::InvalidPageSize { page, line });
        }
        let _ = self.general.clock_hz()?;
        Ok(())
    }
}

/// General run settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Clock frequency of the RTL model, e.g. `"1GHz"`, `"250MHz"`
    #[serde(default = "GeneralConfig::default_clock")]
    pub clock: String,

    /// Maximum number of ticks before the run halts
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,

    /// Ticks reset is held at the start of the run
    #[serde(default = "GeneralConfig::default_reset_cycles")]
    pub reset_cycles: u64,

    /// Log every tick's output signals at debug level
    #[serde(default)]
    pub trace_signals: bool,
}

impl GeneralConfig {
    fn default_clock() -> String {
        defaults::CLOCK.to_string()
    }

    const fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }

    const fn default_reset_cycles() -> u64 {
        defaults::RESET_CYCLES
    }

    /// Clock frequency in Hz.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFrequency`] if `clock` is not `<number><unit>`
    /// with unit `Hz`, `kHz`, `MHz` or `GHz`.
    pub fn clock_hz(&self) -> Result<u64, ConfigError> {
        parse_frequency(&self.clock)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            clock: Self::default_clock(),
            max_cycles: defaults::MAX_CYCLES,
            reset_cycles: defaults::RESET_CYCLES,
            trace_signals: false,
        }
    }
}

/// Protocol engine settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Alignment granularity for request splitting, in bytes
    #[serde(default = "BridgeConfig::default_cache_line")]
    pub cache_line_size: u64,

    /// Width of the AXI data channels, in bytes
    #[serde(default = "BridgeConfig::default_bus_width")]
    pub bus_width_bytes: u64,
}

impl BridgeConfig {
    const fn default_cache_line() -> u64 {
        defaults::CACHE_LINE
    }

    const fn default_bus_width() -> u64 {
        defaults::BUS_WIDTH
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            cache_line_size: defaults::CACHE_LINE,
            bus_width_bytes: defaults::BUS_WIDTH,
        }
    }
}

/// Memory collaborator settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Address translation implementation
    #[serde(default)]
    pub manager: ManagerKind,

    /// Upper bound (exclusive) of identity-translated addresses
    #[serde(default)]
    pub identity_limit: Option<u64>,

    /// Page size of the paged manager
    #[serde(default = "MemoryConfig::default_page_size")]
    pub page_size: u64,

    /// Allocate frames for unmapped pages instead of faulting
    #[serde(default)]
    pub demand_paging: bool,

    /// First physical address handed out by demand paging
    #[serde(default = "MemoryConfig::default_frame_base")]
    pub frame_base: u64,

    /// Latency model of the memory interface
    #[serde(default)]
    pub interface: InterfaceKind,

    /// Fixed latency (simple interface)
    #[serde(default = "MemoryConfig::default_latency")]
    pub latency: u64,

    /// CAS latency (DRAM interface)
    #[serde(default = "MemoryConfig::default_t_cas")]
    pub t_cas: u64,

    /// RAS latency (DRAM interface)
    #[serde(default = "MemoryConfig::default_t_ras")]
    pub t_ras: u64,

    /// Precharge latency (DRAM interface)
    #[serde(default = "MemoryConfig::default_t_pre")]
    pub t_pre: u64,

    /// Row size (DRAM interface)
    #[serde(default = "MemoryConfig::default_row_bytes")]
    pub row_bytes: u64,
}

impl MemoryConfig {
    const fn default_page_size() -> u64 {
        defaults::PAGE_SIZE
    }

    const fn default_frame_base() -> u64 {
        defaults::FRAME_BASE
    }

    const fn default_latency() -> u64 {
        defaults::LATENCY
    }

    const fn default_t_cas() -> u64 {
        defaults::T_CAS
    }

    const fn default_t_ras() -> u64 {
        defaults::T_RAS
    }

    const fn default_t_pre() -> u64 {
        defaults::T_PRE
    }

    const fn default_row_bytes() -> u64 {
        defaults::ROW_BYTES
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            manager: ManagerKind::default(),
            identity_limit: None,
            page_size: defaults::PAGE_SIZE,
            demand_paging: false,
            frame_base: defaults::FRAME_BASE,
            interface: InterfaceKind::default(),
            latency: defaults::LATENCY,
            t_cas: defaults::T_CAS,
            t_ras: defaults::T_RAS,
            t_pre: defaults::T_PRE,
            row_bytes: defaults::ROW_BYTES,
        }
    }
}

/// Parses `"<number><unit>"` (e.g. `"1GHz"`, `"2.5 MHz"`) into Hz.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidFrequency`] for an unknown unit, a non-positive
/// number, or a value that does not fit in `u64`.
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn parse_frequency(text: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidFrequency(text.to_string());
    let trimmed = text.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(invalid)?;
    let (number, unit) = trimmed.split_at(split);
    let value: f64 = number.trim().parse().map_err(|_| invalid())?;
    let scale = match unit.to_ascii_lowercase().as_str() {
        "hz" => 1.0,
        "khz" => 1e3,
        "mhz" => 1e6,
        "ghz" => 1e9,
        _ => return Err(invalid()),
    };
    let hz = (value * scale).round();
    if !hz.is_finite() || hz < 1.0 || hz > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(hz as u64)
}

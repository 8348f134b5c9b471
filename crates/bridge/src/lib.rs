//! Cycle-accurate AXI bridge library.
//!
//! This crate connects an RTL model under test to a memory hierarchy simulator and an
//! upstream trace producer. It provides the following:
//! 1. **Bridge:** The tick-driven AXI protocol engine, request splitter, pending table and upstream adapter.
//! 2. **Memory:** Address translation (`MemoryManager`) and memory interface (`MemoryInterface`) capabilities.
//! 3. **Simulation:** Host tick loop, trace parsing, configuration and statistics.
//!
//! The engine is single-threaded. Memory completions must be handed to
//! [`bridge::AxiEngine::complete`] strictly between ticks, never from inside one.

/// AXI protocol engine, splitter, pending-transaction table and upstream adapter.
pub mod bridge;
/// Common types (addresses, access kinds, errors).
pub mod common;
/// Bridge configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Memory-manager and memory-interface capabilities with their implementations.
pub mod mem;
/// Host simulator loop and trace input.
pub mod sim;
/// Bridge statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The protocol engine; one instance per simulated hardware model.
pub use crate::bridge::AxiEngine;
/// Top-level simulator owning engine, adapter and memory.
pub use crate::sim::Simulator;

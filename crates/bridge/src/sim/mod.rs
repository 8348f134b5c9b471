//! Host simulation loop and trace input.
//!
//! Provides the tick loop that drives the engine from a trace and delivers memory
//! completions between ticks, and the parser for trace files.

/// Tick loop owning engine, adapter and memory.
pub mod simulator;

/// Trace file parsing.
pub mod trace;

pub use simulator::{SimOutcome, Simulator};
pub use trace::TraceError;

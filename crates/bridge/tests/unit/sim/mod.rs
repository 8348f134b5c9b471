//! Simulator tests.

/// End-to-end runs through the simulator loop.
pub mod simulator;

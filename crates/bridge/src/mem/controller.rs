//! Latency models for the timed memory.
//!
//! This module provides:
//! 1. **SimpleController:** Fixed latency per request.
//! 2. **DramController:** Row-buffer-aware latency (CAS, RAS, precharge) keyed on the
//!    physical row of each request.

use crate::common::PhysAddr;

/// Default DRAM row size in bytes.
const DEFAULT_ROW_BYTES: u64 = 2048;

/// Reports how many cycles a physical request takes to complete.
pub trait MemoryController {
    /// Returns the latency in cycles of a request starting at `addr`.
    ///
    /// May update internal state (e.g. the open row), so the order of calls matters.
    fn access_latency(&mut self, addr: PhysAddr) -> u64;
}

/// Fixed-latency controller; every request takes the same number of cycles.
#[derive(Clone, Copy, Debug)]
pub struct SimpleController {
    latency: u64,
}

impl SimpleController {
    /// Creates a controller with the given fixed latency in cycles.
    pub const fn new(latency: u64) -> Self {
        Self { latency }
    }
}

impl MemoryController for SimpleController {
    fn access_latency(&mut self, _addr: PhysAddr) -> u64 {
        self.latency
    }
}

/// DRAM-style controller with a single open row.
///
/// A request to the open row costs `t_cas`; a request with no row open costs
/// `t_ras + t_cas`; a request to a different row costs `t_pre + t_ras + t_cas`.
#[derive(Clone, Copy, Debug)]
pub struct DramController {
    open_row: Option<u64>,
    t_cas: u64,
    t_ras: u64,
    t_pre: u64,
    row_bytes: u64,
}

impl DramController {
    /// Creates a DRAM controller with 2 KiB rows and no row open.
    pub const fn new(t_cas: u64, t_ras: u64, t_pre: u64) -> Self {
        Self {
            open_row: None,
            t_cas,
            t_ras,
            t_pre,
            row_bytes: DEFAULT_ROW_BYTES,
        }
    }

    /// Overrides the row size. `row_bytes` must be a power of two.
    #[must_use]
    pub const fn with_row_bytes(mut self, row_bytes: u64) -> Self {
        self.row_bytes = row_bytes;
        self
    }
}

impl MemoryController for DramController {
    fn access_latency(&mut self, addr: PhysAddr) -> u64 {
        let row = addr.val() / self.row_bytes;
        match self.open_row.replace(row) {
            Some(open) if open == row => self.t_cas,
            Some(_) => self.t_pre + self.t_ras + self.t_cas,
            None => self.t_ras + self.t_cas,
        }
    }
}

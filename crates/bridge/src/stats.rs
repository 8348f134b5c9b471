//! Bridge statistics collection and reporting.
//!
//! This module tracks the counters the bridge exposes to the host. It provides:
//! 1. **Request mix:** Logical read/write/flush/fence request counts and their byte volumes.
//! 2. **Splitting:** How many cache-line boundaries requests crossed, per direction.
//! 3. **Faults:** Requests abandoned because translation failed.
//! 4. **Reporting:** A fixed-width text summary in the simulator's house style.

use std::fmt;
use std::time::Instant;

/// Names of the counters accepted by [`BridgeStats::increment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Logical read requests accepted on AR.
    ReadRequests,
    /// Logical write requests finalized on W.
    WriteRequests,
    /// Bytes requested by read bursts.
    ReadRequestBytes,
    /// Bytes carried by write bursts.
    WriteRequestBytes,
    /// Cache-line boundaries crossed by reads.
    SplitReadRequests,
    /// Cache-line boundaries crossed by writes.
    SplitWriteRequests,
    /// Cache-line flushes processed by the upstream adapter.
    FlushRequests,
    /// Fences processed by the upstream adapter.
    FenceRequests,
    /// Requests abandoned due to a translation fault.
    AddressFaults,
    /// Physical sub-requests handed to the memory interface.
    SubRequestsIssued,
    /// Ticks processed by the engine.
    Cycles,
}

impl Counter {
    /// Every counter, in report order.
    pub const ALL: [Self; 11] = [
        Self::Cycles,
        Self::ReadRequests,
        Self::WriteRequests,
        Self::FlushRequests,
        Self::FenceRequests,
        Self::ReadRequestBytes,
        Self::WriteRequestBytes,
        Self::SplitReadRequests,
        Self::SplitWriteRequests,
        Self::SubRequestsIssued,
        Self::AddressFaults,
    ];

    /// Stable counter name used in reports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReadRequests => "read_requests",
            Self::WriteRequests => "write_requests",
            Self::ReadRequestBytes => "read_request_bytes",
            Self::WriteRequestBytes => "write_request_bytes",
            Self::SplitReadRequests => "split_read_requests",
            Self::SplitWriteRequests => "split_write_requests",
            Self::FlushRequests => "flush_requests",
            Self::FenceRequests => "fence_requests",
            Self::AddressFaults => "address_faults",
            Self::SubRequestsIssued => "sub_requests_issued",
            Self::Cycles => "cycles",
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Counter set owned by one bridge instance.
#[derive(Clone, Debug)]
pub struct BridgeStats {
    start_time: Instant,
    /// Ticks processed by the engine.
    pub cycles: u64,
    /// Logical read requests accepted on AR.
    pub read_requests: u64,
    /// Logical write requests finalized on W.
    pub write_requests: u64,
    /// Bytes requested by read bursts.
    pub read_request_bytes: u64,
    /// Bytes carried by write bursts.
    pub write_request_bytes: u64,
    /// Line boundaries crossed by reads.
    pub split_read_requests: u64,
    /// Line boundaries crossed by writes.
    pub split_write_requests: u64,
    /// Flushes processed upstream.
    pub flush_requests: u64,
    /// Fences processed upstream.
    pub fence_requests: u64,
    /// Requests abandoned due to translation faults.
    pub address_faults: u64,
    /// Physical sub-requests issued to memory.
    pub sub_requests_issued: u64,
}

impl Default for BridgeStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            read_requests: 0,
            write_requests: 0,
            read_request_bytes: 0,
            write_request_bytes: 0,
            split_read_requests: 0,
            split_write_requests: 0,
            flush_requests: 0,
            fence_requests: 0,
            address_faults: 0,
            sub_requests_issued: 0,
        }
    }
}

impl BridgeStats {
    /// Adds `amount` to `counter`. Never fails; saturates instead of wrapping.
    pub fn increment(&mut self, counter: Counter, amount: u64) {
        let slot = self.slot_mut(counter);
        *slot = slot.saturating_add(amount);
    }

    /// Current value of `counter`.
    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::ReadRequests => self.read_requests,
            Counter::WriteRequests => self.write_requests,
            Counter::ReadRequestBytes => self.read_request_bytes,
            Counter::WriteRequestBytes => self.write_request_bytes,
            Counter::SplitReadRequests => self.split_read_requests,
            Counter::SplitWriteRequests => self.split_write_requests,
            Counter::FlushRequests => self.flush_requests,
            Counter::FenceRequests => self.fence_requests,
            Counter::AddressFaults => self.address_faults,
            Counter::SubRequestsIssued => self.sub_requests_issued,
            Counter::Cycles => self.cycles,
        }
    }

    fn slot_mut(&mut self, counter: Counter) -> &mut u64 {
        match counter {
            Counter::ReadRequests => &mut self.read_requests,
            Counter::WriteRequests => &mut self.write_requests,
            Counter::ReadRequestBytes => &mut self.read_request_bytes,
            Counter::WriteRequestBytes => &mut self.write_request_bytes,
            Counter::SplitReadRequests => &mut self.split_read_requests,
            Counter::SplitWriteRequests => &mut self.split_write_requests,
            Counter::FlushRequests => &mut self.flush_requests,
            Counter::FenceRequests => &mut self.fence_requests,
            Counter::AddressFaults => &mut self.address_faults,
            Counter::SubRequestsIssued => &mut self.sub_requests_issued,
            Counter::Cycles => &mut self.cycles,
        }
    }

    /// Merges counters recorded elsewhere into this set.
    pub fn absorb(&mut self, other: &Self) {
        for counter in Counter::ALL {
            self.increment(counter, other.get(counter));
        }
    }

    /// Renders the report printed by [`BridgeStats::print`].
    ///
    /// `clock_hz` converts cycles to simulated time; zero omits that line.
    pub fn report(&self, clock_hz: u64) -> String {
        use std::fmt::Write as _;

        let seconds = self.start_time.elapsed().as_secs_f64();
        let mut out = String::new();
        let _ = writeln!(out, "==========================================================");
        let _ = writeln!(out, "AXI BRIDGE STATISTICS");
        let _ = writeln!(out, "==========================================================");
        let _ = writeln!(out, "host_seconds             {seconds:.4} s");
        if clock_hz > 0 {
            #[allow(clippy::cast_precision_loss)]
            let sim_us = self.cycles as f64 * 1e6 / clock_hz as f64;
            let _ = writeln!(out, "sim_time                 {sim_us:.3} us");
        }
        let _ = writeln!(out, "----------------------------------------------------------");
        for counter in Counter::ALL {
            let _ = writeln!(out, "  {:<22} {}", counter.name(), self.get(counter));
        }
        let requests = (self.read_requests + self.write_requests).max(1);
        let split = self.split_read_requests + self.split_write_requests;
        #[allow(clippy::cast_precision_loss)]
        let ratio = split as f64 / requests as f64;
        let _ = writeln!(out, "  split_ratio            {ratio:.4}");
        let _ = writeln!(out, "==========================================================");
        out
    }

    /// Prints the report to stdout.
    pub fn print(&self, clock_hz: u64) {
        print!("{}", self.report(clock_hz));
    }
}

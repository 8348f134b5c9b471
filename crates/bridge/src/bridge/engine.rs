//! AXI protocol engine.
//!
//! The engine is the slave side of a five-channel AXI interface, evaluated once per
//! simulated clock. Every tick it:
//! 1. **Resets** all state when `reset` is asserted, ignoring the other inputs.
//! 2. **Accepts** a read address (AR is always ready) and splits it immediately.
//! 3. **Accepts** a write address when no write burst is in flight (the store-in-flight latch).
//! 4. **Accepts** write data beats while the latch is set; the `last` beat finalizes the
//!    burst, splits it, and clears the latch.
//! 5. **Retires** the presented R beat and B response when the master is ready.
//!
//! Ready/valid outputs are a pure function of the state at the start of the tick, so the
//! master can sample [`AxiEngine::outputs`] before driving its inputs. A handshake the
//! engine cannot take is simply not granted; nothing is queued on its behalf.
//!
//! # Completions
//!
//! Memory completions enter through [`AxiEngine::complete`]. The host must call it
//! strictly between ticks, never while a tick is being evaluated; the engine relies on
//! this and takes no locks.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use tracing::{debug, trace, warn};

use super::pending::{Completion, PendingTable};
use super::signals::{AddrChannel, AxiInputs, AxiOutputs, WriteChannel};
use super::splitter::Splitter;
use super::transaction::{BusRequest, BusResponse, WritePayload};
use crate::common::constants::{MAX_BEAT_SIZE_LOG2, MAX_BURST_BEATS, RESP_OKAY};
use crate::common::{AccessKind, BridgeError, VirtAddr};
use crate::mem::{MemRequest, MemResponse, MemoryInterface, MemoryManager};
use crate::stats::{BridgeStats, Counter};

/// A write burst between its address phase and its `last` data beat.
#[derive(Clone, Debug)]
struct WriteBurst {
    id: u64,
    addr: VirtAddr,
    beat_bytes: u64,
    beats: u64,
    beats_seen: u64,
    payload: WritePayload,
}

/// Tick-driven AXI slave bridging a bus master to a memory interface.
pub struct AxiEngine {
    manager: Box<dyn MemoryManager>,
    memory: Box<dyn MemoryInterface>,
    splitter: Splitter,
    pending: PendingTable,
    read_queue: VecDeque<BusResponse>,
    write_queue: VecDeque<BusResponse>,
    /// Beats of the front read response already consumed.
    read_beat: u64,
    /// `Some` exactly while the store-in-flight latch is set.
    burst: Option<WriteBurst>,
    busy_reads: HashSet<u64>,
    busy_writes: HashSet<u64>,
    faults: Vec<BridgeError>,
    stats: BridgeStats,
    cycle: u64,
    trace_signals: bool,
}

impl AxiEngine {
    /// Creates an engine splitting on `line_size` and using the injected capabilities.
    pub fn new(
        line_size: u64,
        manager: Box<dyn MemoryManager>,
        memory: Box<dyn MemoryInterface>,
    ) -> Self {
        Self {
            manager,
            memory,
            splitter: Splitter::new(line_size),
            pending: PendingTable::new(),
            read_queue: VecDeque::new(),
            write_queue: VecDeque::new(),
            read_beat: 0,
            burst: None,
            busy_reads: HashSet::new(),
            busy_writes: HashSet::new(),
            faults: Vec::new(),
            stats: BridgeStats::default(),
            cycle: 0,
            trace_signals: false,
        }
    }

    /// Logs the output signals of every tick at debug level.
    pub const fn set_trace_signals(&mut self, enabled: bool) {
        self.trace_signals = enabled;
    }

    // ── Output signals ─────────────────────────────────────────────

    /// AR is always ready.
    #[inline]
    pub const fn ar_ready(&self) -> bool {
        true
    }

    /// AW is ready while no write burst is in flight.
    #[inline]
    pub const fn aw_ready(&self) -> bool {
        self.burst.is_none()
    }

    /// W is ready while a write burst is in flight.
    #[inline]
    pub const fn w_ready(&self) -> bool {
        self.burst.is_some()
    }

    /// A read beat is presented.
    #[inline]
    pub fn r_valid(&self) -> bool {
        !self.read_queue.is_empty()
    }

    /// Id of the presented read beat (0 when idle).
    pub fn r_id(&self) -> u64 {
        self.read_queue.front().map_or(0, |r| r.axi_id)
    }

    /// Data of the presented read beat (empty when idle).
    pub fn r_data(&self) -> &[u8] {
        self.read_queue
            .front()
            .map_or(&[][..], |r| r.beat(self.read_beat))
    }

    /// The presented read beat is the last of its response.
    pub fn r_last(&self) -> bool {
        self.read_queue
            .front()
            .is_some_and(|r| self.read_beat + 1 == r.beats())
    }

    /// A write response is presented.
    #[inline]
    pub fn b_valid(&self) -> bool {
        !self.write_queue.is_empty()
    }

    /// Id of the presented write response (0 when idle).
    pub fn b_id(&self) -> u64 {
        self.write_queue.front().map_or(0, |b| b.axi_id)
    }

    /// Snapshot of every output signal.
    pub fn outputs(&self) -> AxiOutputs {
        AxiOutputs {
            ar_ready: self.ar_ready(),
            aw_ready: self.aw_ready(),
            w_ready: self.w_ready(),
            r_valid: self.r_valid(),
            r_id: self.r_id(),
            r_data: self.r_data().to_vec(),
            r_last: self.r_last(),
            r_resp: RESP_OKAY,
            b_valid: self.b_valid(),
            b_id: self.b_id(),
            b_resp: RESP_OKAY,
        }
    }

    // ── Tick ───────────────────────────────────────────────────────

    /// Evaluates one clock cycle.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ProtocolViolation`] if the inputs are inconsistent with the
    /// bridge state. The error is fatal; the engine must not be ticked again without reset.
    pub fn tick(&mut self, cycle: u64, inputs: &AxiInputs) -> Result<(), BridgeError> {
        self.cycle = cycle;
        self.stats.increment(Counter::Cycles, 1);

        if inputs.reset {
            self.reset();
            return Ok(());
        }

        // Handshakes are judged against the signals driven at the start of the cycle.
        let ar_fire = inputs.ar.valid && self.ar_ready();
        let aw_fire = inputs.aw.valid && self.aw_ready();
        let w_fire = inputs.w.valid && self.w_ready();
        let r_fire = inputs.r_ready && self.r_valid();
        let b_fire = inputs.b_ready && self.b_valid();

        if self.trace_signals {
            debug!(cycle, outputs = ?self.outputs(), "signals");
        }

        if ar_fire {
            self.accept_read_address(&inputs.ar)?;
        }
        if aw_fire {
            self.accept_write_address(&inputs.aw)?;
        }
        if w_fire {
            self.accept_write_beat(&inputs.w)?;
        }
        if r_fire {
            self.retire_read_beat();
        }
        if b_fire {
            self.retire_write_response();
        }
        Ok(())
    }

    /// Clears every queue, the pending table and the store-in-flight latch.
    ///
    /// Sub-requests already handed to memory are orphaned: their completions are
    /// dropped when they arrive.
    pub fn reset(&mut self) {
        if !self.is_quiescent() {
            debug!(
                cycle = self.cycle,
                pending = self.pending.len(),
                "reset discards in-flight state"
            );
        }
        self.pending.reset();
        self.read_queue.clear();
        self.write_queue.clear();
        self.read_beat = 0;
        self.burst = None;
        self.busy_reads.clear();
        self.busy_writes.clear();
        self.faults.clear();
    }

    fn check_address_phase(&self, ch: &AddrChannel, kind: AccessKind) -> Result<(), BridgeError> {
        if ch.size > MAX_BEAT_SIZE_LOG2 {
            return Err(BridgeError::violation(
                self.cycle,
                format!("{kind} id {} beat size 2^{} exceeds 2^{MAX_BEAT_SIZE_LOG2}", ch.id, ch.size),
            ));
        }
        if ch.beats() > MAX_BURST_BEATS {
            return Err(BridgeError::violation(
                self.cycle,
                format!("{kind} id {} burst of {} beats exceeds {MAX_BURST_BEATS}", ch.id, ch.beats()),
            ));
        }
        let busy = match kind {
            AccessKind::Read => &self.busy_reads,
            AccessKind::Write => &self.busy_writes,
        };
        if busy.contains(&ch.id) {
            return Err(BridgeError::violation(
                self.cycle,
                format!("{kind} id {} reused while its previous request is outstanding", ch.id),
            ));
        }
        Ok(())
    }

    fn accept_read_address(&mut self, ar: &AddrChannel) -> Result<(), BridgeError> {
        self.check_address_phase(ar, AccessKind::Read)?;
        debug!(cycle = self.cycle, id = ar.id, addr = ar.addr, bytes = ar.burst_bytes(), "AR accepted");
        let req = BusRequest::read(ar.id, VirtAddr::new(ar.addr), ar.burst_bytes(), ar.beat_bytes());
        self.dispatch(req);
        Ok(())
    }

    fn accept_write_address(&mut self, aw: &AddrChannel) -> Result<(), BridgeError> {
        if self.burst.is_some() {
            return Err(BridgeError::violation(
                self.cycle,
                "write address accepted while a write burst is in flight",
            ));
        }
        self.check_address_phase(aw, AccessKind::Write)?;
        debug!(cycle = self.cycle, id = aw.id, addr = aw.addr, bytes = aw.burst_bytes(), "AW accepted");
        let _ = self.busy_writes.insert(aw.id);
        self.burst = Some(WriteBurst {
            id: aw.id,
            addr: VirtAddr::new(aw.addr),
            beat_bytes: aw.beat_bytes(),
            beats: aw.beats(),
            beats_seen: 0,
            payload: WritePayload::disabled(aw.burst_bytes() as usize),
        });
        Ok(())
    }

    fn accept_write_beat(&mut self, w: &WriteChannel) -> Result<(), BridgeError> {
        let cycle = self.cycle;
        let Some(burst) = self.burst.as_mut() else {
            return Err(BridgeError::violation(cycle, "write data without a write address"));
        };
        let is_final = burst.beats_seen + 1 == burst.beats;
        if w.last != is_final {
            return Err(BridgeError::violation(
                cycle,
                format!(
                    "write id {} beat {} of {} has last={}",
                    burst.id,
                    burst.beats_seen + 1,
                    burst.beats,
                    w.last
                ),
            ));
        }

        let base = burst.beats_seen * burst.beat_bytes;
        for (lane, &byte) in w.data.iter().enumerate().take(burst.beat_bytes as usize) {
            if w.lane_enabled(lane as u64) {
                let at = (base + lane as u64) as usize;
                burst.payload.data[at] = byte;
                burst.payload.enables[at] = true;
            }
        }
        burst.beats_seen += 1;
        #[cfg(any(debug_assertions, feature = "always-trace"))]
        trace!(cycle, id = burst.id, beat = burst.beats_seen, strb = w.strb, "W beat");

        if w.last
            && let Some(done) = self.burst.take()
        {
            debug!(
                cycle,
                id = done.id,
                enabled = done.payload.enabled_bytes(),
                "W burst complete"
            );
            let req = BusRequest::write(done.id, done.addr, done.payload, done.beat_bytes);
            self.dispatch(req);
        }
        Ok(())
    }

    /// Splits, registers and issues one logical request, or records its fault.
    fn dispatch(&mut self, req: BusRequest) {
        let (count, bytes, splits) = match req.kind {
            AccessKind::Read => (
                Counter::ReadRequests,
                Counter::ReadRequestBytes,
                Counter::SplitReadRequests,
            ),
            AccessKind::Write => (
                Counter::WriteRequests,
                Counter::WriteRequestBytes,
                Counter::SplitWriteRequests,
            ),
        };
        self.stats.increment(count, 1);
        self.stats.increment(bytes, req.len);

        let plan = match self.splitter.split(&req, self.manager.as_mut()) {
            Ok(plan) => plan,
            Err(fault) => {
                warn!(cycle = self.cycle, id = req.axi_id, kind = %req.kind, %fault, "request abandoned");
                self.stats.increment(Counter::AddressFaults, 1);
                if req.kind.is_write() {
                    let _ = self.busy_writes.remove(&req.axi_id);
                }
                self.faults.push(BridgeError::AddressFault {
                    axi_id: req.axi_id,
                    kind: req.kind,
                    fault,
                });
                return;
            }
        };

        if req.kind == AccessKind::Read {
            let _ = self.busy_reads.insert(req.axi_id);
        }
        if plan.is_empty() {
            self.enqueue(BusResponse {
                axi_id: req.axi_id,
                kind: req.kind,
                data: (req.kind == AccessKind::Read).then(Vec::new),
                beat_bytes: req.beat_bytes,
            });
            return;
        }

        self.stats.increment(splits, plan.extra_splits());
        let payload = req.payload.as_ref().map(|p| p.data.as_slice());
        for sub in self.pending.register(&req, &plan) {
            let start = sub.offset as usize;
            let end = start + sub.len as usize;
            self.stats.increment(Counter::SubRequestsIssued, 1);
            self.memory.issue(MemRequest {
                id: sub.txn,
                paddr: sub.paddr,
                len: sub.len,
                kind: req.kind,
                payload: payload.map(|data| data[start..end].to_vec()),
                cycle: self.cycle,
            });
        }
    }

    fn enqueue(&mut self, resp: BusResponse) {
        match resp.kind {
            AccessKind::Read => self.read_queue.push_back(resp),
            AccessKind::Write => self.write_queue.push_back(resp),
        }
    }

    fn retire_read_beat(&mut self) {
        let Some(front) = self.read_queue.front() else {
            return;
        };
        self.read_beat += 1;
        if self.read_beat < front.beats() {
            return;
        }
        self.read_beat = 0;
        if let Some(done) = self.read_queue.pop_front() {
            let _ = self.busy_reads.remove(&done.axi_id);
            debug!(cycle = self.cycle, id = done.axi_id, "R complete");
        }
    }

    fn retire_write_response(&mut self) {
        if let Some(done) = self.write_queue.pop_front() {
            let _ = self.busy_writes.remove(&done.axi_id);
            debug!(cycle = self.cycle, id = done.axi_id, "B complete");
        }
    }

    // ── Completions (between ticks) ────────────────────────────────

    /// Applies one memory completion.
    ///
    /// Must only be called between ticks.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TransactionNotFound`] or [`BridgeError::CompletionMismatch`]
    /// if the completion does not match an in-flight sub-request. Both are fatal.
    pub fn complete(&mut self, resp: MemResponse) -> Result<(), BridgeError> {
        match self.pending.complete(resp)? {
            Completion::Resolved(bus) => {
                trace!(id = bus.axi_id, kind = %bus.kind, "response queued");
                self.enqueue(bus);
            }
            Completion::Pending | Completion::Orphaned => {}
        }
        Ok(())
    }

    /// Polls the memory interface for completions ready at `cycle` and applies them.
    ///
    /// Must only be called between ticks.
    ///
    /// # Errors
    ///
    /// As [`AxiEngine::complete`].
    pub fn drain_memory(&mut self, cycle: u64) -> Result<usize, BridgeError> {
        let ready = self.memory.poll(cycle);
        let count = ready.len();
        for resp in ready {
            self.complete(resp)?;
        }
        Ok(count)
    }

    /// Takes the address faults recorded since the last call.
    pub fn take_faults(&mut self) -> Vec<BridgeError> {
        std::mem::take(&mut self.faults)
    }

    // ── Introspection ──────────────────────────────────────────────

    /// `true` when nothing is in flight: no pending entry, no queued response, no write
    /// burst, and nothing outstanding at the memory interface.
    pub fn is_quiescent(&self) -> bool {
        self.pending.is_empty()
            && self.read_queue.is_empty()
            && self.write_queue.is_empty()
            && self.burst.is_none()
            && self.memory.in_flight() == 0
    }

    /// The store-in-flight latch.
    pub const fn store_in_flight(&self) -> bool {
        self.burst.is_some()
    }

    /// The pending-transaction table.
    pub const fn pending(&self) -> &PendingTable {
        &self.pending
    }

    /// Responses waiting on R (first) and B (second).
    pub fn queued_responses(&self) -> (usize, usize) {
        (self.read_queue.len(), self.write_queue.len())
    }

    /// Counters recorded by this engine.
    pub const fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    /// Mutable counters, for collaborators that record into the same set.
    pub const fn stats_mut(&mut self) -> &mut BridgeStats {
        &mut self.stats
    }

    /// The memory interface.
    pub fn memory(&self) -> &dyn MemoryInterface {
        self.memory.as_ref()
    }

    /// Alignment granularity of the splitter.
    pub const fn line_size(&self) -> u64 {
        self.splitter.line_size()
    }
}

impl fmt::Debug for AxiEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AxiEngine")
            .field("cycle", &self.cycle)
            .field("line_size", &self.splitter.line_size())
            .field("pending", &self.pending.len())
            .field("read_queue", &self.read_queue.len())
            .field("write_queue", &self.write_queue.len())
            .field("store_in_flight", &self.burst.is_some())
            .finish_non_exhaustive()
    }
}

//! Upstream event adapter.
//!
//! The adapter is the bus master facing the engine. A trace producer submits
//! [`UpstreamEvent`]s; the adapter encodes each as one AXI burst, drives it onto the
//! address and data channels, and turns the responses it consumes back into
//! [`UpstreamReply`]s. It:
//! 1. **Encodes** lengths as INCR bursts using the widest beat that divides both the
//!    length and the start address, up to the bus width.
//! 2. **Allocates** AXI ids from a fixed pool per channel; a request waits for a free id.
//! 3. **Orders** events: they leave the queue in submission order, a request overlapping
//!    an in-flight request of the other direction waits for it, a flush waits for
//!    everything touching its cache line, and a fence waits for everything before it.
//! 4. **Reports** address faults recorded by the engine as [`UpstreamReply::Fault`].
//!
//! Valid signals never depend on ready: [`UpstreamAdapter::drive`] only looks at
//! adapter state, and [`UpstreamAdapter::observe`] applies the handshakes that fired.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;

use thiserror::Error;
use tracing::{debug, trace, warn};

use super::signals::{AddrChannel, AxiInputs, AxiOutputs, WriteChannel};
use crate::common::constants::{DEFAULT_FLUSH_LINE, DEFAULT_ID_POOL, MAX_BURST_BEATS};
use crate::common::{AccessKind, BridgeError, VirtAddr};

/// A request from the trace producer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// Load `len` bytes from `vaddr`.
    Read {
        /// Start address.
        vaddr: VirtAddr,
        /// Bytes to load.
        len: u64,
    },
    /// Store `data` at `vaddr`.
    Write {
        /// Start address.
        vaddr: VirtAddr,
        /// Bytes to store.
        data: Vec<u8>,
    },
    /// Write back the cache line holding `vaddr`: waits for every in-flight request
    /// touching that line.
    Flush {
        /// Any address within the line.
        vaddr: VirtAddr,
    },
    /// Wait for every earlier request to resolve.
    Fence,
}

impl UpstreamEvent {
    fn span(&self) -> Option<(AccessKind, VirtAddr, u64)> {
        match self {
            Self::Read { vaddr, len } => Some((AccessKind::Read, *vaddr, *len)),
            Self::Write { vaddr, data } => Some((AccessKind::Write, *vaddr, data.len() as u64)),
            Self::Flush { .. } | Self::Fence => None,
        }
    }
}

/// Adapter-assigned identifier of one submitted event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// Outcome of one submitted event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpstreamReply {
    /// The request completed. `data` carries the loaded bytes of a read.
    Ack {
        /// The acknowledged request.
        request: RequestId,
        /// Loaded bytes; `None` for writes and fences.
        data: Option<Vec<u8>>,
    },
    /// The request was abandoned because an address failed to translate.
    Fault {
        /// The abandoned request.
        request: RequestId,
        /// The address that failed to translate.
        vaddr: VirtAddr,
    },
}

impl UpstreamReply {
    /// The request this reply answers.
    pub const fn request(&self) -> RequestId {
        match self {
            Self::Ack { request, .. } | Self::Fault { request, .. } => *request,
        }
    }
}

/// Events no single burst can carry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// More bytes than the widest legal burst at this alignment moves.
    #[error("{len} bytes at {vaddr} need {beats} beats of {beat_bytes} bytes, more than {MAX_BURST_BEATS}")]
    RequestTooLarge {
        /// Start address.
        vaddr: VirtAddr,
        /// Requested bytes.
        len: u64,
        /// Widest usable beat.
        beat_bytes: u64,
        /// Beats that beat width would need.
        beats: u64,
    },
    /// A read or write of zero bytes.
    #[error("zero-length {kind} at {vaddr}")]
    ZeroLength {
        /// Direction of the request.
        kind: AccessKind,
        /// Start address.
        vaddr: VirtAddr,
    },
}

/// Beat size exponent and `len` field of an INCR burst.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Burst {
    /// `size` field: beats carry `1 << size` bytes.
    pub size: u64,
    /// `len` field: the burst has `len + 1` beats.
    pub len: u64,
}

impl Burst {
    /// Encodes `len` bytes at `vaddr` for a bus `bus_width` bytes wide.
    ///
    /// # Errors
    ///
    /// [`UpstreamError::ZeroLength`] for an empty request and
    /// [`UpstreamError::RequestTooLarge`] when no beat width fits in 256 beats.
    pub fn encode(
        kind: AccessKind,
        vaddr: VirtAddr,
        len: u64,
        bus_width: u64,
    ) -> Result<Self, UpstreamError> {
        if len == 0 {
            return Err(UpstreamError::ZeroLength { kind, vaddr });
        }
        let alignment = 1u64 << (len | vaddr.val()).trailing_zeros().min(63);
        let beat_bytes = alignment.min(bus_width);
        let beats = len / beat_bytes;
        if beats > MAX_BURST_BEATS {
            return Err(UpstreamError::RequestTooLarge {
                vaddr,
                len,
                beat_bytes,
                beats,
            });
        }
        Ok(Self {
            size: u64::from(beat_bytes.trailing_zeros()),
            len: beats - 1,
        })
    }

    /// Bytes per beat.
    pub const fn beat_bytes(self) -> u64 {
        1 << self.size
    }
}

#[derive(Clone, Debug)]
struct Queued {
    request: RequestId,
    event: UpstreamEvent,
    burst: Option<Burst>,
}

/// A read between its address phase and its last R beat.
#[derive(Clone, Debug)]
struct ReadSlot {
    request: RequestId,
    channel: AddrChannel,
}

/// A write from its address phase to its last W beat.
#[derive(Clone, Debug)]
struct WriteSlot {
    request: RequestId,
    channel: AddrChannel,
    data: Vec<u8>,
    address_done: bool,
    next_beat: u64,
}

impl WriteSlot {
    fn beat(&self) -> WriteChannel {
        let width = self.channel.beat_bytes() as usize;
        let start = self.next_beat as usize * width;
        let end = (start + width).min(self.data.len());
        WriteChannel::beat(self.data[start..end].to_vec(), self.next_beat == self.channel.len)
    }
}

#[derive(Clone, Debug)]
struct InFlight {
    request: RequestId,
    vaddr: VirtAddr,
    len: u64,
    data: Vec<u8>,
}

/// Bus master driving trace events into the engine.
#[derive(Debug)]
pub struct UpstreamAdapter {
    bus_width: u64,
    line_size: u64,
    next_request: u64,
    queue: VecDeque<Queued>,
    ar: Option<ReadSlot>,
    write: Option<WriteSlot>,
    reads: HashMap<u64, InFlight>,
    writes: HashMap<u64, InFlight>,
    free_read_ids: BTreeSet<u64>,
    free_write_ids: BTreeSet<u64>,
    id_pool: u64,
    replies: Vec<UpstreamReply>,
}

impl UpstreamAdapter {
    /// Creates an adapter for a bus `bus_width` bytes wide with the default id pool.
    pub fn new(bus_width: u64) -> Self {
        Self::with_id_pool(bus_width, DEFAULT_ID_POOL)
    }

    /// Creates an adapter handing out ids `0..id_pool` on each channel.
    pub fn with_id_pool(bus_width: u64, id_pool: u64) -> Self {
        debug_assert!(bus_width.is_power_of_two());
        let id_pool = id_pool.max(1);
        Self {
            bus_width,
            line_size: DEFAULT_FLUSH_LINE,
            next_request: 0,
            queue: VecDeque::new(),
            ar: None,
            write: None,
            reads: HashMap::new(),
            writes: HashMap::new(),
            free_read_ids: (0..id_pool).collect(),
            free_write_ids: (0..id_pool).collect(),
            id_pool,
            replies: Vec::new(),
        }
    }

    /// Sets the cache line a flush waits on; a power of two.
    #[must_use]
    pub fn with_line_size(mut self, line_size: u64) -> Self {
        debug_assert!(line_size.is_power_of_two());
        self.line_size = line_size;
        self
    }

    /// Queues `event` and returns the id its reply will carry.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the event cannot be encoded as a single burst.
    /// Nothing is queued in that case.
    pub fn submit(&mut self, event: UpstreamEvent) -> Result<RequestId, UpstreamError> {
        let burst = event
            .span()
            .map(|(kind, vaddr, len)| Burst::encode(kind, vaddr, len, self.bus_width))
            .transpose()?;
        let request = RequestId(self.next_request);
        self.next_request += 1;
        trace!(%request, ?event, "submitted");
        self.queue.push_back(Queued {
            request,
            event,
            burst,
        });
        Ok(request)
    }

    /// Returns the signals to drive this cycle.
    ///
    /// Starts the next queued events first if their ordering rules allow it.
    pub fn drive(&mut self) -> AxiInputs {
        self.start_ready_events();
        let mut inputs = AxiInputs::idle();
        if let Some(slot) = &self.ar {
            inputs.ar = slot.channel.clone();
        }
        if let Some(slot) = &self.write {
            if slot.address_done {
                inputs.w = slot.beat();
            } else {
                inputs.aw = slot.channel.clone();
            }
        }
        inputs
    }

    /// Applies the handshakes that fired this cycle.
    ///
    /// `outputs` must be the engine outputs sampled before the tick that consumed
    /// `inputs`.
    pub fn observe(&mut self, inputs: &AxiInputs, outputs: &AxiOutputs) {
        if outputs.ar_fire(inputs)
            && let Some(slot) = self.ar.take()
        {
            debug!(request = %slot.request, id = slot.channel.id, "read address sent");
            let _ = self.reads.insert(
                slot.channel.id,
                InFlight {
                    request: slot.request,
                    vaddr: VirtAddr::new(slot.channel.addr),
                    len: slot.channel.burst_bytes(),
                    data: Vec::new(),
                },
            );
        }
        if outputs.aw_fire(inputs)
            && let Some(slot) = self.write.as_mut()
        {
            slot.address_done = true;
        }
        if outputs.w_fire(inputs) {
            self.advance_write();
        }
        if outputs.r_fire(inputs) {
            self.receive_read_beat(outputs);
        }
        if outputs.b_fire(inputs) {
            self.receive_write_response(outputs.b_id);
        }
    }

    /// Converts an engine address fault into a reply. Other errors are ignored.
    pub fn on_fault(&mut self, err: &BridgeError) {
        let BridgeError::AddressFault {
            axi_id,
            kind,
            fault,
        } = err
        else {
            return;
        };
        let (in_flight, free) = match kind {
            AccessKind::Read => (&mut self.reads, &mut self.free_read_ids),
            AccessKind::Write => (&mut self.writes, &mut self.free_write_ids),
        };
        let Some(done) = in_flight.remove(axi_id) else {
            warn!(id = axi_id, %kind, "fault for an id with no request in flight");
            return;
        };
        let _ = free.insert(*axi_id);
        warn!(request = %done.request, vaddr = %fault.vaddr(), "request faulted");
        self.replies.push(UpstreamReply::Fault {
            request: done.request,
            vaddr: fault.vaddr(),
        });
    }

    /// Takes the replies produced since the last call.
    pub fn take_replies(&mut self) -> Vec<UpstreamReply> {
        std::mem::take(&mut self.replies)
    }

    /// `true` when every submitted event has been answered.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.is_drained()
    }

    /// Events submitted but not yet started on the bus.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Requests started on the bus and not yet answered.
    pub fn in_flight(&self) -> usize {
        self.reads.len()
            + self.writes.len()
            + usize::from(self.ar.is_some())
            + usize::from(self.write.is_some())
    }

    /// Forgets everything in flight and queued; ids return to the pool.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.ar = None;
        self.write = None;
        self.reads.clear();
        self.writes.clear();
        self.free_read_ids = (0..self.id_pool).collect();
        self.free_write_ids = (0..self.id_pool).collect();
    }

    fn is_drained(&self) -> bool {
        self.in_flight() == 0
    }

    fn start_ready_events(&mut self) {
        while let Some(head) = self.queue.front() {
            let ready = match (&head.event, head.event.span()) {
                (UpstreamEvent::Flush { vaddr }, _) => {
                    let base = VirtAddr::new(vaddr.val() & !(self.line_size - 1));
                    !self.overlaps(AccessKind::Read, base, self.line_size)
                        && !self.overlaps(AccessKind::Write, base, self.line_size)
                }
                (_, None) => self.is_drained(),
                (_, Some((AccessKind::Read, vaddr, len))) => {
                    self.ar.is_none()
                        && !self.free_read_ids.is_empty()
                        && !self.overlaps(AccessKind::Write, vaddr, len)
                }
                (_, Some((AccessKind::Write, vaddr, len))) => {
                    self.write.is_none()
                        && !self.free_write_ids.is_empty()
                        && !self.overlaps(AccessKind::Read, vaddr, len)
                }
            };
            if !ready {
                break;
            }
            let Some(head) = self.queue.pop_front() else {
                break;
            };
            self.start(head);
        }
    }

    fn start(&mut self, queued: Queued) {
        let Queued {
            request,
            event,
            burst,
        } = queued;
        match (event, burst) {
            (UpstreamEvent::Read { vaddr, .. }, Some(burst)) => {
                if let Some(id) = self.free_read_ids.pop_first() {
                    self.ar = Some(ReadSlot {
                        request,
                        channel: AddrChannel::request(vaddr.val(), id, burst.size, burst.len),
                    });
                }
            }
            (UpstreamEvent::Write { vaddr, data }, Some(burst)) => {
                if let Some(id) = self.free_write_ids.pop_first() {
                    self.write = Some(WriteSlot {
                        request,
                        channel: AddrChannel::request(vaddr.val(), id, burst.size, burst.len),
                        data,
                        address_done: false,
                        next_beat: 0,
                    });
                }
            }
            (UpstreamEvent::Flush { vaddr }, _) => {
                debug!(%request, %vaddr, "flush complete");
                self.replies.push(UpstreamReply::Ack {
                    request,
                    data: None,
                });
            }
            _ => {
                debug!(%request, "fence complete");
                self.replies.push(UpstreamReply::Ack {
                    request,
                    data: None,
                });
            }
        }
    }

    /// `true` if `[vaddr, vaddr + len)` overlaps an in-flight request of direction `kind`.
    fn overlaps(&self, kind: AccessKind, vaddr: VirtAddr, len: u64) -> bool {
        let start = vaddr.val();
        let end = start.saturating_add(len);
        let hits = |other: u64, other_len: u64| start < other.saturating_add(other_len) && other < end;
        match kind {
            AccessKind::Read => {
                self.ar
                    .as_ref()
                    .is_some_and(|s| hits(s.channel.addr, s.channel.burst_bytes()))
                    || self.reads.values().any(|r| hits(r.vaddr.val(), r.len))
            }
            AccessKind::Write => {
                self.write
                    .as_ref()
                    .is_some_and(|s| hits(s.channel.addr, s.data.len() as u64))
                    || self.writes.values().any(|w| hits(w.vaddr.val(), w.len))
            }
        }
    }

    fn advance_write(&mut self) {
        let Some(slot) = self.write.as_mut() else {
            return;
        };
        let was_last = slot.next_beat == slot.channel.len;
        slot.next_beat += 1;
        if !was_last {
            return;
        }
        if let Some(slot) = self.write.take() {
            debug!(request = %slot.request, id = slot.channel.id, "write burst sent");
            let _ = self.writes.insert(
                slot.channel.id,
                InFlight {
                    request: slot.request,
                    vaddr: VirtAddr::new(slot.channel.addr),
                    len: slot.data.len() as u64,
                    data: Vec::new(),
                },
            );
        }
    }

    fn receive_read_beat(&mut self, outputs: &AxiOutputs) {
        let Some(read) = self.reads.get_mut(&outputs.r_id) else {
            warn!(id = outputs.r_id, "read data for an id with no request in flight");
            return;
        };
        read.data.extend_from_slice(&outputs.r_data);
        if !outputs.r_last {
            return;
        }
        if let Some(done) = self.reads.remove(&outputs.r_id) {
            let _ = self.free_read_ids.insert(outputs.r_id);
            debug!(request = %done.request, bytes = done.data.len(), "read acknowledged");
            self.replies.push(UpstreamReply::Ack {
                request: done.request,
                data: Some(done.data),
            });
        }
    }

    fn receive_write_response(&mut self, id: u64) {
        let Some(done) = self.writes.remove(&id) else {
            warn!(id, "write response for an id with no request in flight");
            return;
        };
        let _ = self.free_write_ids.insert(id);
        debug!(request = %done.request, "write acknowledged");
        self.replies.push(UpstreamReply::Ack {
            request: done.request,
            data: None,
        });
    }
}

//! Logical and physical transaction records.
//!
//! A [`BusRequest`] is one AXI burst after its handshake(s) completed. The splitter
//! turns it into [`SubRequest`]s that each stay inside one cache line; the pending
//! table folds their completions back into a single [`BusResponse`].

use crate::common::{AccessKind, PhysAddr, VirtAddr};
use crate::mem::TxnId;

/// Engine-assigned tag of one logical request while its sub-requests are in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParentTag(pub u64);

/// Write data accumulated from the W channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WritePayload {
    /// Burst bytes, lowest address first.
    pub data: Vec<u8>,
    /// Per-byte enables from the strobes; disabled bytes are never written.
    pub enables: Vec<bool>,
}

impl WritePayload {
    /// A payload with every byte enabled.
    pub fn full(data: Vec<u8>) -> Self {
        let enables = vec![true; data.len()];
        Self { data, enables }
    }

    /// A zeroed payload of `len` bytes with every byte disabled.
    pub fn disabled(len: usize) -> Self {
        Self {
            data: vec![0; len],
            enables: vec![false; len],
        }
    }

    /// Number of enabled bytes.
    pub fn enabled_bytes(&self) -> usize {
        self.enables.iter().filter(|&&e| e).count()
    }
}

/// One logical request taken off the address/data channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusRequest {
    /// AXI id of the burst.
    pub axi_id: u64,
    /// Start address on the bus.
    pub vaddr: VirtAddr,
    /// Total bytes of the burst.
    pub len: u64,
    /// Direction.
    pub kind: AccessKind,
    /// Write data; `Some` exactly for writes.
    pub payload: Option<WritePayload>,
    /// Bytes per beat, used to re-beat the read response.
    pub beat_bytes: u64,
}

impl BusRequest {
    /// A read burst.
    pub const fn read(axi_id: u64, vaddr: VirtAddr, len: u64, beat_bytes: u64) -> Self {
        Self {
            axi_id,
            vaddr,
            len,
            kind: AccessKind::Read,
            payload: None,
            beat_bytes,
        }
    }

    /// A write burst carrying `payload`.
    pub fn write(axi_id: u64, vaddr: VirtAddr, payload: WritePayload, beat_bytes: u64) -> Self {
        Self {
            axi_id,
            vaddr,
            len: payload.data.len() as u64,
            kind: AccessKind::Write,
            payload: Some(payload),
            beat_bytes,
        }
    }
}

/// One cache-line-bounded piece of a [`BusRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubRequest {
    /// Unique id handed to the memory interface.
    pub txn: TxnId,
    /// Translated start address.
    pub paddr: PhysAddr,
    /// Bytes covered.
    pub len: u64,
    /// Offset of the first byte within the parent request.
    pub offset: u64,
    /// Owning logical request.
    pub parent: ParentTag,
}

/// A reassembled response waiting on the R or B channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusResponse {
    /// AXI id of the originating request.
    pub axi_id: u64,
    /// Direction of the originating request.
    pub kind: AccessKind,
    /// Read data in address order; `None` for write acknowledgements.
    pub data: Option<Vec<u8>>,
    /// Bytes per R beat.
    pub beat_bytes: u64,
}

impl BusResponse {
    /// Number of R beats needed to present this response. Always at least one.
    pub fn beats(&self) -> u64 {
        let len = self.data.as_ref().map_or(0, Vec::len) as u64;
        len.div_ceil(self.beat_bytes.max(1)).max(1)
    }

    /// Data of beat `index`; empty past the end or for write acknowledgements.
    pub fn beat(&self, index: u64) -> &[u8] {
        let Some(data) = self.data.as_deref() else {
            return &[];
        };
        let width = self.beat_bytes.max(1) as usize;
        let start = (index as usize).saturating_mul(width).min(data.len());
        let end = start.saturating_add(width).min(data.len());
        &data[start..end]
    }
}

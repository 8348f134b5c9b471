//! Memory-interface capability.
//!
//! The memory interface is the boundary to the cache hierarchy. Requests are issued
//! fire-and-forget and tagged with an engine-assigned [`TxnId`]; each issued request
//! produces exactly one [`MemResponse`] at some later cycle. Completions are pulled by
//! the host with [`MemoryInterface::poll`] between ticks and handed to the engine.

use std::fmt;

use crate::common::{AccessKind, PhysAddr};

/// Engine-assigned identifier of one physical sub-request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxnId(pub u64);

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn#{}", self.0)
    }
}

/// A physical request handed to the memory interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemRequest {
    /// Transaction id echoed back in the completion.
    pub id: TxnId,
    /// Physical start address.
    pub paddr: PhysAddr,
    /// Number of bytes to transfer; never crosses a cache line.
    pub len: u64,
    /// Direction of the transfer.
    pub kind: AccessKind,
    /// Bytes to store; `Some` exactly for writes, with `len` bytes.
    pub payload: Option<Vec<u8>>,
    /// Cycle whose tick issued the request.
    pub cycle: u64,
}

/// Completion of a previously issued [`MemRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemResponse {
    /// Transaction id of the completed request.
    pub id: TxnId,
    /// Loaded bytes for reads; `None` for write acknowledgements.
    pub data: Option<Vec<u8>>,
}

impl MemResponse {
    /// Completion of a read carrying `data`.
    pub const fn read(id: TxnId, data: Vec<u8>) -> Self {
        Self {
            id,
            data: Some(data),
        }
    }

    /// Acknowledgement of a write.
    pub const fn write_ack(id: TxnId) -> Self {
        Self { id, data: None }
    }
}

/// Capability that services physical requests.
pub trait MemoryInterface {
    /// Issues a request. Never fails and never blocks.
    fn issue(&mut self, req: MemRequest);

    /// Returns every completion that became ready at or before `cycle`.
    ///
    /// Called by the host between ticks; each issued request must be returned
    /// exactly once over the lifetime of the interface.
    fn poll(&mut self, cycle: u64) -> Vec<MemResponse>;

    /// Number of issued requests that have not been returned by `poll` yet.
    fn in_flight(&self) -> usize;
}

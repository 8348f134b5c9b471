//! Latency-modelled memory interface.
//!
//! `TimedMemory` stands in for the cache hierarchy. It owns a sparse byte store and a
//! [`MemoryController`] that assigns each request a latency. The store is updated (for
//! writes) or sampled (for reads) when the request is issued; the latency only delays
//! the completion. Completions come back from `poll` ordered by ready cycle, then by
//! issue order, so requests of different latency may overtake each other.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::trace;

use super::controller::MemoryController;
use super::interface::{MemRequest, MemResponse, MemoryInterface};
use crate::common::PhysAddr;

/// Granule of the sparse store.
const STORE_PAGE: u64 = 4096;

/// Sparse, zero-initialised byte store.
#[derive(Clone, Debug, Default)]
pub struct SparseStore {
    pages: HashMap<u64, Box<[u8]>>,
}

impl SparseStore {
    /// Copies `len` bytes starting at `addr`; untouched bytes read as zero.
    pub fn read(&self, addr: PhysAddr, len: u64) -> Vec<u8> {
        (0..len)
            .map(|i| {
                let a = addr.val().wrapping_add(i);
                self.pages
                    .get(&(a / STORE_PAGE))
                    .map_or(0, |page| page[(a % STORE_PAGE) as usize])
            })
            .collect()
    }

    /// Stores `data` starting at `addr`.
    pub fn write(&mut self, addr: PhysAddr, data: &[u8]) {
        for (i, byte) in data.iter().enumerate() {
            let a = addr.val().wrapping_add(i as u64);
            let page = self
                .pages
                .entry(a / STORE_PAGE)
                .or_insert_with(|| vec![0; STORE_PAGE as usize].into_boxed_slice());
            page[(a % STORE_PAGE) as usize] = *byte;
        }
    }

    /// Number of store pages touched by writes.
    pub fn resident_pages(&self) -> usize {
        self.pages.len()
    }
}

/// Memory interface with per-request latency.
pub struct TimedMemory {
    store: SparseStore,
    controller: Box<dyn MemoryController>,
    pending: BTreeMap<(u64, u64), MemResponse>,
    seq: u64,
}

impl TimedMemory {
    /// Creates an empty memory timed by `controller`.
    pub fn new(controller: Box<dyn MemoryController>) -> Self {
        Self {
            store: SparseStore::default(),
            controller,
            pending: BTreeMap::new(),
            seq: 0,
        }
    }

    /// Read access to the backing store.
    pub const fn store(&self) -> &SparseStore {
        &self.store
    }

    /// Writes `data` directly into the backing store, bypassing timing.
    pub fn load(&mut self, addr: PhysAddr, data: &[u8]) {
        self.store.write(addr, data);
    }
}

impl fmt::Debug for TimedMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedMemory")
            .field("pending", &self.pending.len())
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

impl MemoryInterface for TimedMemory {
    fn issue(&mut self, req: MemRequest) {
        let latency = self.controller.access_latency(req.paddr);
        let ready = req.cycle.saturating_add(1).saturating_add(latency);
        let response = match req.payload {
            Some(payload) => {
                self.store.write(req.paddr, &payload);
                MemResponse::write_ack(req.id)
            }
            None => MemResponse::read(req.id, self.store.read(req.paddr, req.len)),
        };
        trace!(id = %req.id, paddr = %req.paddr, len = req.len, ready, "memory issue");
        let _ = self.pending.insert((ready, self.seq), response);
        self.seq += 1;
    }

    fn poll(&mut self, cycle: u64) -> Vec<MemResponse> {
        let later = self.pending.split_off(&(cycle.saturating_add(1), 0));
        std::mem::replace(&mut self.pending, later)
            .into_values()
            .collect()
    }

    fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

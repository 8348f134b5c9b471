//! Pending-transaction table.
//!
//! Tracks every physical sub-request between issue and completion and folds the
//! completions of siblings back into one logical response. It provides:
//! 1. **Registration:** A parent entry is created with its full sibling count before
//!    any sibling is issued, so an early completion can never bring it to zero.
//! 2. **Reassembly:** Read data is copied in at each sub-request's recorded offset.
//! 3. **Resolution:** The entry is removed and its response produced exactly once,
//!    when the last sibling completes.
//! 4. **Reset:** Entries are discarded; ids still in flight are remembered as orphans
//!    so that their late completions are dropped rather than reported as unknown.

use std::collections::{HashMap, HashSet};

use tracing::{trace, warn};

use super::splitter::SplitPlan;
use super::transaction::{BusRequest, BusResponse, ParentTag, SubRequest};
use crate::common::{AccessKind, BridgeError};
use crate::mem::{MemResponse, TxnId};

/// Reassembly state of one logical request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingEntry {
    /// AXI id of the logical request.
    pub axi_id: u64,
    /// Direction of the logical request.
    pub kind: AccessKind,
    /// Sub-requests not yet completed.
    pub outstanding: u64,
    /// Read data assembled so far; `None` for writes.
    pub data: Option<Vec<u8>>,
    /// Bytes per R beat of the eventual response.
    pub beat_bytes: u64,
}

#[derive(Clone, Copy, Debug)]
struct SubRecord {
    parent: ParentTag,
    offset: u64,
    len: u64,
}

/// What a completion did to the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Siblings are still outstanding.
    Pending,
    /// The last sibling completed; the response is ready to queue.
    Resolved(BusResponse),
    /// The completion belonged to a request discarded by reset and was dropped.
    Orphaned,
}

/// Map from sub-request id to the reassembly state of its parent.
#[derive(Debug, Default)]
pub struct PendingTable {
    entries: HashMap<ParentTag, PendingEntry>,
    subs: HashMap<TxnId, SubRecord>,
    orphans: HashSet<TxnId>,
    next_tag: u64,
    next_txn: u64,
    created: u64,
    removed: u64,
    discarded: u64,
}

impl PendingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `req` split as `plan` and returns the sub-requests to issue.
    ///
    /// `plan` must not be empty; an empty plan resolves without touching memory.
    pub fn register(&mut self, req: &BusRequest, plan: &SplitPlan) -> Vec<SubRequest> {
        debug_assert!(!plan.is_empty());
        let parent = ParentTag(self.next_tag);
        self.next_tag += 1;

        let entry = PendingEntry {
            axi_id: req.axi_id,
            kind: req.kind,
            outstanding: plan.runs.len() as u64,
            data: match req.kind {
                AccessKind::Read => Some(vec![0; req.len as usize]),
                AccessKind::Write => None,
            },
            beat_bytes: req.beat_bytes,
        };
        let _ = self.entries.insert(parent, entry);
        self.created += 1;

        plan.runs
            .iter()
            .map(|piece| {
                let txn = TxnId(self.next_txn);
                self.next_txn += 1;
                let _ = self.subs.insert(
                    txn,
                    SubRecord {
                        parent,
                        offset: piece.run.offset,
                        len: piece.run.len,
                    },
                );
                SubRequest {
                    txn,
                    paddr: piece.paddr,
                    len: piece.run.len,
                    offset: piece.run.offset,
                    parent,
                }
            })
            .collect()
    }

    /// Applies one memory completion.
    ///
    /// # Errors
    ///
    /// [`BridgeError::TransactionNotFound`] for an id that was never registered (or
    /// already completed), [`BridgeError::CompletionMismatch`] for a read completion
    /// whose data length differs from the sub-request.
    pub fn complete(&mut self, resp: MemResponse) -> Result<Completion, BridgeError> {
        let txn = resp.id;
        let Some(sub) = self.subs.remove(&txn) else {
            if self.orphans.remove(&txn) {
                warn!(%txn, "dropping completion of a request discarded by reset");
                return Ok(Completion::Orphaned);
            }
            return Err(BridgeError::TransactionNotFound { txn: txn.0 });
        };
        let entry = self
            .entries
            .get_mut(&sub.parent)
            .ok_or(BridgeError::TransactionNotFound { txn: txn.0 })?;

        if let Some(buf) = entry.data.as_mut() {
            let data = resp.data.unwrap_or_default();
            if data.len() as u64 != sub.len {
                return Err(BridgeError::CompletionMismatch {
                    txn: txn.0,
                    expected: sub.len,
                    actual: data.len() as u64,
                });
            }
            let start = sub.offset as usize;
            buf[start..start + data.len()].copy_from_slice(&data);
        }

        entry.outstanding -= 1;
        trace!(%txn, parent = sub.parent.0, left = entry.outstanding, "sub-request completed");
        if entry.outstanding > 0 {
            return Ok(Completion::Pending);
        }

        let Some(done) = self.entries.remove(&sub.parent) else {
            return Err(BridgeError::TransactionNotFound { txn: txn.0 });
        };
        self.removed += 1;
        Ok(Completion::Resolved(BusResponse {
            axi_id: done.axi_id,
            kind: done.kind,
            data: done.data,
            beat_bytes: done.beat_bytes,
        }))
    }

    /// Discards every entry; in-flight ids become orphans.
    pub fn reset(&mut self) {
        self.discarded += self.entries.len() as u64;
        self.entries.clear();
        self.orphans.extend(self.subs.drain().map(|(txn, _)| txn));
    }

    /// Looks up the entry of a parent.
    pub fn entry(&self, parent: ParentTag) -> Option<&PendingEntry> {
        self.entries.get(&parent)
    }

    /// Logical requests still waiting on memory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no logical request is waiting on memory.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sub-requests issued and not yet completed.
    pub fn outstanding_subs(&self) -> usize {
        self.subs.len()
    }

    /// Orphaned ids whose completion has not arrived yet.
    pub fn orphans(&self) -> usize {
        self.orphans.len()
    }

    /// Entries ever created.
    pub const fn created(&self) -> u64 {
        self.created
    }

    /// Entries resolved and removed.
    pub const fn removed(&self) -> u64 {
        self.removed
    }

    /// Entries dropped by reset.
    pub const fn discarded(&self) -> u64 {
        self.discarded
    }
}

//! Bridge error and translation fault definitions.
//!
//! This module defines the error taxonomy of the bridge. It provides:
//! 1. **Fatal Errors:** Protocol violations and bookkeeping defects that halt the simulation.
//! 2. **Recoverable Errors:** Address faults that abandon one request and are reported upstream.
//! 3. **Translation Faults:** The outcome of a failed virtual-to-physical resolution.

use thiserror::Error;

use super::addr::VirtAddr;
use super::data::AccessKind;

/// Errors raised by the protocol engine and the pending-transaction table.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The hardware model drove a signal combination the bridge cannot follow.
    ///
    /// The bridge state no longer matches the model, so the run must stop.
    #[error("protocol violation at cycle {cycle}: {reason}")]
    ProtocolViolation {
        /// Cycle on which the violation was observed.
        cycle: u64,
        /// Human-readable description of the offending signals.
        reason: String,
    },

    /// A sub-request of a bus request could not be translated.
    ///
    /// The whole parent request is abandoned; no partial response is produced.
    #[error("address fault on {kind} id {axi_id}: {fault}")]
    AddressFault {
        /// AXI id of the abandoned request.
        axi_id: u64,
        /// Direction of the abandoned request.
        kind: AccessKind,
        /// The underlying translation fault.
        fault: Fault,
    },

    /// A memory completion named a transaction id with no pending entry.
    #[error("completion for unknown transaction {txn}")]
    TransactionNotFound {
        /// The unknown local transaction id.
        txn: u64,
    },

    /// A read completion carried a different number of bytes than was requested.
    #[error("completion for transaction {txn} carried {actual} bytes, expected {expected}")]
    CompletionMismatch {
        /// Local transaction id of the completion.
        txn: u64,
        /// Bytes requested by the sub-request.
        expected: u64,
        /// Bytes delivered by the memory interface.
        actual: u64,
    },
}

impl BridgeError {
    /// Returns `true` if the simulation cannot continue after this error.
    ///
    /// Only address faults are recoverable.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::AddressFault { .. })
    }

    pub(crate) fn violation(cycle: u64, reason: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            cycle,
            reason: reason.into(),
        }
    }
}

/// Failure to resolve a virtual address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Fault {
    /// No mapping exists for the page containing the address.
    #[error("unmapped address {vaddr}")]
    Unmapped {
        /// The faulting virtual address.
        vaddr: VirtAddr,
    },

    /// The address lies outside the range the manager can translate.
    #[error("address {vaddr} out of range")]
    OutOfRange {
        /// The faulting virtual address.
        vaddr: VirtAddr,
    },
}

impl Fault {
    /// The virtual address that failed to resolve.
    pub const fn vaddr(&self) -> VirtAddr {
        match self {
            Self::Unmapped { vaddr } | Self::OutOfRange { vaddr } => *vaddr,
        }
    }
}

//! Memory-side capabilities of the bridge.
//!
//! The engine reaches memory only through two injected capabilities:
//! 1. **Manager:** [`MemoryManager`] resolves virtual bus addresses to physical addresses.
//! 2. **Interface:** [`MemoryInterface`] accepts fire-and-forget physical requests and
//!    reports their completions when polled by the host between ticks.
//!
//! Concrete implementations are provided for both so a run can be assembled from
//! configuration alone: identity and paged managers, and a latency-modelled memory
//! backed by a sparse store.

/// Latency models for the timed memory.
pub mod controller;

/// Memory-interface capability and request/response types.
pub mod interface;

/// Memory-manager capability and its implementations.
pub mod manager;

/// Latency-modelled memory interface backed by a sparse byte store.
pub mod timed;

pub use controller::{DramController, MemoryController, SimpleController};
pub use interface::{MemRequest, MemResponse, MemoryInterface, TxnId};
pub use manager::{IdentityManager, MemoryManager, PagedManager};
pub use timed::TimedMemory;

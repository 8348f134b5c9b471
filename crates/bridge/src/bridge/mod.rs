//! AXI bridge.
//!
//! The bridge connects a bus master to the memory hierarchy:
//! 1. **Engine:** Ticked AXI slave holding the channel handshakes and response queues.
//! 2. **Splitter:** Cache-line partitioning and address translation of each request.
//! 3. **Pending table:** Reassembly of sub-request completions into one response.
//! 4. **Upstream adapter:** Bus master that turns read/write/fence events into bursts.

/// Tick-driven AXI slave.
pub mod engine;

/// Pending-transaction table.
pub mod pending;

/// Channel signal bundles.
pub mod signals;

/// Cache-line splitting and translation.
pub mod splitter;

/// Logical and physical transaction records.
pub mod transaction;

/// Event-driven bus master.
pub mod upstream;

pub use engine::AxiEngine;
pub use pending::{Completion, PendingTable};
pub use signals::{AddrChannel, AxiInputs, AxiOutputs, WriteChannel};
pub use splitter::{SplitPlan, Splitter};
pub use transaction::{BusRequest, BusResponse, WritePayload};
pub use upstream::{RequestId, UpstreamAdapter, UpstreamError, UpstreamEvent, UpstreamReply};

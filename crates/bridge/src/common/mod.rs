//! Common utilities and types shared by every part of the bridge.
//!
//! This module provides:
//! 1. **Address Types:** Strong types for virtual and physical addresses.
//! 2. **Constants:** Protocol-wide constants (burst limits, response codes).
//! 3. **Access Kinds:** Read/write classification of bus and memory requests.
//! 4. **Error Handling:** Fatal and recoverable bridge errors and translation faults.

/// Address type definitions (physical and virtual addresses).
pub mod addr;

/// Protocol constants.
pub mod constants;

/// Access kind definitions.
pub mod data;

/// Error types.
pub mod error;

pub use addr::{PhysAddr, VirtAddr};
pub use data::AccessKind;
pub use error::{BridgeError, Fault};

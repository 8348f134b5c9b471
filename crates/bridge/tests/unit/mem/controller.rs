//! Memory Controller Unit Tests.
//!
//! Verifies SimpleController (fixed latency) and DramController
//! (row-buffer-aware latency with CAS/RAS/precharge).

use rtlbridge_core::common::PhysAddr;
use rtlbridge_core::mem::{DramController, MemoryController, SimpleController};

// ══════════════════════════════════════════════════════════
// 1. SimpleController
// ══════════════════════════════════════════════════════════

#[test]
fn simple_controller_fixed_latency() {
    let mut ctrl = SimpleController::new(10);
    for addr in [0x0, 0x1000, 0xdead_beef] {
        assert_eq!(ctrl.access_latency(PhysAddr::new(addr)), 10);
    }
}

#[test]
fn simple_controller_zero_latency() {
    let mut ctrl = SimpleController::new(0);
    assert_eq!(ctrl.access_latency(PhysAddr::new(0)), 0);
}

// ══════════════════════════════════════════════════════════
// 2. DramController
// ══════════════════════════════════════════════════════════

#[test]
fn dram_first_access_opens_row() {
    let mut ctrl = DramController::new(10, 20, 30);
    assert_eq!(ctrl.access_latency(PhysAddr::new(0x0)), 30);
}

#[test]
fn dram_row_hit_costs_cas_only() {
    let mut ctrl = DramController::new(10, 20, 30);
    let _ = ctrl.access_latency(PhysAddr::new(0x0));
    assert_eq!(ctrl.access_latency(PhysAddr::new(0x7FF)), 10);
}

#[test]
fn dram_row_miss_precharges() {
    let mut ctrl = DramController::new(10, 20, 30);
    let _ = ctrl.access_latency(PhysAddr::new(0x0));
    assert_eq!(ctrl.access_latency(PhysAddr::new(0x800)), 60);
    assert_eq!(ctrl.access_latency(PhysAddr::new(0x810)), 10);
}

#[test]
fn dram_row_size_is_configurable() {
    let mut ctrl = DramController::new(1, 2, 4).with_row_bytes(64);
    let _ = ctrl.access_latency(PhysAddr::new(0x0));
    assert_eq!(ctrl.access_latency(PhysAddr::new(0x40)), 7);
}

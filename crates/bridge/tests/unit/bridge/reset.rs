//! Reset Tests.
//!
//! Reset clears the queues, the pending table and the latch. Completions of
//! sub-requests issued before the reset are dropped when they arrive.

use rtlbridge_core::bridge::{AddrChannel, AxiInputs};
use rtlbridge_core::mem::MemResponse;

use crate::common::harness::BridgeHarness;

#[test]
fn reset_with_nothing_asserted_leaves_channels_idle() {
    let mut h = BridgeHarness::new(64);
    h.reset();
    assert!(!h.engine.r_valid());
    assert!(!h.engine.b_valid());
    assert!(h.engine.aw_ready());
    assert!(!h.engine.w_ready());
}

#[test]
fn reset_clears_queued_responses_and_latch() {
    let mut h = BridgeHarness::new(64);
    let _ = h.read(0, 1, 3, 0).unwrap();
    h.write(0x40, 1, 3, &[vec![0; 8]]).unwrap();
    h.complete_all().unwrap();
    let _ = h.write_address(0x80, 2, 3, 3).unwrap();
    assert!(h.engine.r_valid() && h.engine.b_valid() && h.engine.w_ready());

    h.reset();
    assert!(!h.engine.r_valid());
    assert!(!h.engine.b_valid());
    assert!(h.engine.aw_ready());
    assert!(!h.engine.store_in_flight());
    assert!(h.engine.is_quiescent());
}

#[test]
fn reset_ignores_other_inputs() {
    let mut h = BridgeHarness::new(64);
    let _ = h
        .tick(&AxiInputs {
            reset: true,
            ar: AddrChannel::request(0, 1, 3, 0),
            aw: AddrChannel::request(0, 1, 3, 0),
            ..AxiInputs::default()
        })
        .unwrap();
    assert!(h.issued().is_empty());
    assert!(h.engine.aw_ready());
}

#[test]
fn late_completion_after_reset_is_dropped() {
    let mut h = BridgeHarness::new(64);
    let _ = h.read(60, 1, 2, 3).unwrap();
    let issued = h.issued();
    h.complete(issued[0].id).unwrap();

    h.reset();
    assert!(h.engine.pending().is_empty());
    assert_eq!(h.engine.pending().orphans(), 1);
    assert_eq!(h.engine.pending().discarded(), 1);

    h.complete(issued[1].id).unwrap();
    assert!(!h.engine.r_valid(), "orphaned completion must not produce a response");
    assert_eq!(h.engine.pending().orphans(), 0);
}

#[test]
fn ids_are_free_after_reset() {
    let mut h = BridgeHarness::new(64);
    let _ = h.read(0, 1, 3, 0).unwrap();
    h.reset();
    assert!(h.read(0, 1, 3, 0).is_ok());
}

#[test]
fn new_requests_after_reset_do_not_collide_with_orphans() {
    let mut h = BridgeHarness::new(64);
    let _ = h.read(0, 1, 3, 0).unwrap();
    let old = h.issued()[0].clone();
    h.reset();

    let _ = h.read(0x100, 1, 3, 0).unwrap();
    let fresh = h.issued()[1].clone();
    assert_ne!(old.id, fresh.id);

    h.complete_with(MemResponse::read(old.id, vec![0; 8])).unwrap();
    assert!(!h.engine.r_valid());
    h.complete(fresh.id).unwrap();
    assert!(h.engine.r_valid());
}

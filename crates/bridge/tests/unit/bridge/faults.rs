//! Address Fault Tests.
//!
//! A request with any untranslatable piece is abandoned as a whole: nothing
//! is issued, nothing is registered and no response is ever presented.

use mockall::predicate::eq;
use rtlbridge_core::common::{AccessKind, BridgeError, Fault, PhysAddr, VirtAddr};
use rtlbridge_core::mem::IdentityManager;
use rtlbridge_core::stats::Counter;

use crate::common::harness::BridgeHarness;
use crate::common::mocks::memory::MockManager;

#[test]
fn unresolvable_read_reports_fault_and_no_response() {
    let mut manager = MockManager::new();
    let _ = manager
        .expect_resolve()
        .returning(|vaddr| Err(Fault::Unmapped { vaddr }));
    let mut h = BridgeHarness::with_manager(64, Box::new(manager));

    let _ = h.read(0x4000, 6, 3, 0).unwrap();
    let faults = h.engine.take_faults();
    assert_eq!(
        faults,
        vec![BridgeError::AddressFault {
            axi_id: 6,
            kind: AccessKind::Read,
            fault: Fault::Unmapped {
                vaddr: VirtAddr::new(0x4000)
            },
        }]
    );
    assert!(!faults[0].is_fatal());
    assert!(h.issued().is_empty());
    assert!(h.engine.pending().is_empty());
    for _ in 0..4 {
        h.idle();
        assert!(!h.engine.r_valid());
    }
    assert!(h.engine.take_faults().is_empty(), "faults are taken once");
    assert_eq!(h.engine.stats().get(Counter::AddressFaults), 1);
}

#[test]
fn fault_on_second_piece_abandons_whole_request() {
    let mut manager = MockManager::new();
    let _ = manager
        .expect_resolve()
        .with(eq(VirtAddr::new(60)))
        .times(1)
        .returning(|v| Ok(PhysAddr::new(v.val())));
    let _ = manager
        .expect_resolve()
        .with(eq(VirtAddr::new(64)))
        .times(1)
        .returning(|vaddr| Err(Fault::OutOfRange { vaddr }));
    let mut h = BridgeHarness::with_manager(64, Box::new(manager));

    let _ = h.read(60, 2, 2, 3).unwrap();
    assert!(h.issued().is_empty(), "no piece is issued when any piece faults");
    assert_eq!(h.engine.pending().created(), 0);
    let faults = h.engine.take_faults();
    assert!(matches!(
        faults.as_slice(),
        [BridgeError::AddressFault {
            fault: Fault::OutOfRange { .. },
            ..
        }]
    ));
}

#[test]
fn faulted_write_releases_latch_and_id() {
    let mut h = BridgeHarness::with_manager(64, Box::new(IdentityManager::with_limit(0x1000)));
    h.write(0x2000, 3, 3, &[vec![1; 8]]).unwrap();

    assert_eq!(h.engine.take_faults().len(), 1);
    assert!(h.engine.aw_ready());
    assert!(!h.engine.b_valid());
    assert!(h.write(0x800, 3, 3, &[vec![1; 8]]).is_ok(), "id 3 is free again");
    assert_eq!(h.issued().len(), 1);
}

#[test]
fn faulted_read_id_is_free() {
    let mut h = BridgeHarness::with_manager(64, Box::new(IdentityManager::with_limit(0x1000)));
    let _ = h.read(0x1000, 1, 3, 0).unwrap();
    assert_eq!(h.engine.take_faults().len(), 1);
    assert!(h.read(0x0, 1, 3, 0).is_ok());
}

#[test]
fn request_wrapping_the_address_space_faults() {
    let mut h = BridgeHarness::new(64);
    let _ = h.read(u64::MAX - 3, 1, 3, 0).unwrap();
    assert!(matches!(
        h.engine.take_faults().as_slice(),
        [BridgeError::AddressFault {
            fault: Fault::OutOfRange { .. },
            ..
        }]
    ));
    assert!(h.issued().is_empty());
}

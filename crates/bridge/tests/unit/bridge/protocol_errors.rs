//! Protocol Error Tests.
//!
//! Signal combinations the bridge cannot follow make `tick` fail, and
//! completions that do not match an in-flight sub-request make `complete` fail.

use rtlbridge_core::bridge::WriteChannel;
use rtlbridge_core::common::BridgeError;
use rtlbridge_core::mem::{MemResponse, TxnId};

use crate::common::harness::BridgeHarness;

fn is_violation(result: &Result<impl Sized, BridgeError>) -> bool {
    matches!(result, Err(BridgeError::ProtocolViolation { .. }))
}

// ══════════════════════════════════════════════════════════
// 1. Address phase
// ══════════════════════════════════════════════════════════

#[test]
fn duplicate_outstanding_read_id() {
    let mut h = BridgeHarness::new(64);
    let _ = h.read(0x000, 3, 3, 0).unwrap();
    let err = h.read(0x100, 3, 3, 0);
    assert!(is_violation(&err), "{err:?}");
}

#[test]
fn read_id_stays_busy_until_response_consumed() {
    let mut h = BridgeHarness::new(64);
    let _ = h.read(0x000, 3, 3, 0).unwrap();
    h.complete_all().unwrap();
    assert!(h.engine.r_valid());
    assert!(is_violation(&h.read(0x100, 3, 3, 0)));
}

#[test]
fn duplicate_outstanding_write_id() {
    let mut h = BridgeHarness::new(64);
    h.write(0x000, 5, 3, &[vec![0; 8]]).unwrap();
    assert!(is_violation(&h.write_address(0x100, 5, 3, 0)));
}

#[test]
fn same_id_on_different_channels_is_allowed() {
    let mut h = BridgeHarness::new(64);
    let _ = h.read(0x000, 5, 3, 0).unwrap();
    assert!(h.write(0x100, 5, 3, &[vec![0; 8]]).is_ok());
}

#[test]
fn oversized_beat() {
    let mut h = BridgeHarness::new(64);
    assert!(is_violation(&h.read(0x000, 1, 8, 0)));
}

#[test]
fn burst_longer_than_256_beats() {
    let mut h = BridgeHarness::new(64);
    assert!(is_violation(&h.read(0x000, 1, 0, 256)));
    assert!(h.read(0x000, 1, 0, 255).is_ok());
}

#[test]
fn burst_length_at_the_top_of_the_field_range() {
    let mut h = BridgeHarness::new(64);
    assert!(is_violation(&h.read(0x100, 1, 3, u64::MAX)));
    assert!(is_violation(&h.write_address(0x100, 1, 3, u64::MAX)));
    assert!(h.issued().is_empty());
    assert!(h.engine.aw_ready(), "a rejected AW leaves the latch clear");
}

// ══════════════════════════════════════════════════════════
// 2. Data phase
// ══════════════════════════════════════════════════════════

#[test]
fn early_last() {
    let mut h = BridgeHarness::new(64);
    let _ = h.write_address(0x000, 1, 3, 2).unwrap();
    assert!(is_violation(&h.write_beat(WriteChannel::beat(vec![0; 8], true))));
}

#[test]
fn missing_last() {
    let mut h = BridgeHarness::new(64);
    let _ = h.write_address(0x000, 1, 3, 1).unwrap();
    let _ = h.write_beat(WriteChannel::beat(vec![0; 8], false)).unwrap();
    assert!(is_violation(&h.write_beat(WriteChannel::beat(vec![0; 8], false))));
}

// ══════════════════════════════════════════════════════════
// 3. Completions
// ══════════════════════════════════════════════════════════

#[test]
fn unknown_transaction() {
    let mut h = BridgeHarness::new(64);
    let err = h.complete_with(MemResponse::read(TxnId(999), vec![]));
    assert_eq!(err, Err(BridgeError::TransactionNotFound { txn: 999 }));
    assert!(err.unwrap_err().is_fatal());
}

#[test]
fn completing_twice() {
    let mut h = BridgeHarness::new(64);
    let _ = h.read(60, 1, 2, 3).unwrap();
    let txn = h.issued()[0].id;
    h.complete(txn).unwrap();
    assert_eq!(
        h.complete(txn),
        Err(BridgeError::TransactionNotFound { txn: txn.0 })
    );
}

#[test]
fn long_read_completion() {
    let mut h = BridgeHarness::new(64);
    let _ = h.read(0, 1, 3, 0).unwrap();
    let txn = h.issued()[0].id;
    assert_eq!(
        h.complete_with(MemResponse::read(txn, vec![0; 9])),
        Err(BridgeError::CompletionMismatch {
            txn: txn.0,
            expected: 8,
            actual: 9,
        })
    );
}

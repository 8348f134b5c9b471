//! Timed Memory Tests.
//!
//! Completions are returned once their latency has elapsed, ordered by
//! ready cycle, with the data the store held at issue time.

use pretty_assertions::assert_eq;
use rtlbridge_core::common::{AccessKind, PhysAddr};
use rtlbridge_core::mem::{
    DramController, MemRequest, MemResponse, MemoryInterface, SimpleController, TimedMemory,
    TxnId,
};

fn read(id: u64, paddr: u64, len: u64) -> MemRequest {
    MemRequest {
        id: TxnId(id),
        paddr: PhysAddr::new(paddr),
        len,
        kind: AccessKind::Read,
        payload: None,
        cycle: 0,
    }
}

#[test]
fn preloaded_data_is_served() {
    let mut mem = TimedMemory::new(Box::new(SimpleController::new(1)));
    mem.load(PhysAddr::new(0x80), &[9, 8, 7]);
    mem.issue(read(0, 0x80, 3));
    assert_eq!(mem.in_flight(), 1);
    assert_eq!(mem.poll(2), vec![MemResponse::read(TxnId(0), vec![9, 8, 7])]);
    assert_eq!(mem.store().read(PhysAddr::new(0x80), 1), vec![9]);
}

#[test]
fn faster_request_overtakes_slower_one() {
    // Row miss for the first request, row hit for the second.
    let mut mem = TimedMemory::new(Box::new(DramController::new(2, 5, 5)));
    mem.issue(read(1, 0x0, 4));
    mem.issue(read(2, 0x10, 4));
    let done: Vec<TxnId> = mem.poll(100).into_iter().map(|r| r.id).collect();
    assert_eq!(done, vec![TxnId(2), TxnId(1)]);
}

#[test]
fn poll_returns_each_completion_once() {
    let mut mem = TimedMemory::new(Box::new(SimpleController::new(0)));
    mem.issue(read(1, 0, 1));
    assert_eq!(mem.poll(5).len(), 1);
    assert!(mem.poll(6).is_empty());
    assert_eq!(mem.in_flight(), 0);
}

#[test]
fn latency_counts_from_the_issue_cycle() {
    let mut mem = TimedMemory::new(Box::new(SimpleController::new(2)));
    assert!(mem.poll(3).is_empty());
    mem.issue(MemRequest {
        cycle: 20,
        ..read(4, 0x40, 2)
    });
    assert!(mem.poll(22).is_empty());
    assert_eq!(mem.poll(23), vec![MemResponse::read(TxnId(4), vec![0; 2])]);
}

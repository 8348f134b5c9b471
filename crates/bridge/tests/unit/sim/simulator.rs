//! Simulator Tests.
//!
//! Whole runs through `Simulator`: configuration selects the collaborators,
//! the adapter masters the engine, and timed memory answers.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rtlbridge_core::bridge::{UpstreamEvent, UpstreamReply};
use rtlbridge_core::common::{PhysAddr, VirtAddr};
use rtlbridge_core::config::{Config, ConfigError, InterfaceKind, ManagerKind};
use rtlbridge_core::mem::{IdentityManager, SimpleController, TimedMemory};
use rtlbridge_core::sim::Simulator;
use rtlbridge_core::stats::Counter;

fn read(addr: u64, len: u64) -> UpstreamEvent {
    UpstreamEvent::Read {
        vaddr: VirtAddr::new(addr),
        len,
    }
}

fn write(addr: u64, data: Vec<u8>) -> UpstreamEvent {
    UpstreamEvent::Write {
        vaddr: VirtAddr::new(addr),
        data,
    }
}

#[test]
fn read_after_write_returns_written_bytes() {
    let mut sim = Simulator::new(&Config::default()).unwrap();
    let data: Vec<u8> = (0xA0..0xB0).collect();
    let w = sim.submit(write(0x38, data.clone())).unwrap();
    let r = sim.submit(read(0x38, 16)).unwrap();

    let outcome = sim.run().unwrap();
    assert!(outcome.quiescent);
    assert_eq!(outcome.pending, 0);
    assert_eq!(outcome.unanswered, 0);
    let table = sim.engine.pending();
    assert_eq!(table.outstanding_subs(), 0);
    assert_eq!(table.created(), table.removed());
    assert_eq!(sim.engine.memory().in_flight(), 0);
    assert_eq!(sim.engine.line_size(), 64);
    assert_eq!(
        outcome.replies,
        vec![
            UpstreamReply::Ack {
                request: w,
                data: None
            },
            UpstreamReply::Ack {
                request: r,
                data: Some(data)
            },
        ]
    );

    let stats = sim.stats();
    assert_eq!(stats.get(Counter::WriteRequests), 1);
    assert_eq!(stats.get(Counter::ReadRequests), 1);
    assert_eq!(stats.get(Counter::WriteRequestBytes), 16);
    assert_eq!(stats.get(Counter::SplitWriteRequests), 1);
    assert_eq!(stats.get(Counter::SplitReadRequests), 1);
    assert_eq!(stats.get(Counter::SubRequestsIssued), 4);
    assert_eq!(stats.get(Counter::Cycles), outcome.cycles);
}

#[rstest]
#[case(0)]
#[case(3)]
fn read_completes_one_cycle_after_its_latency(#[case] latency: u64) {
    let memory = TimedMemory::new(Box::new(SimpleController::new(latency)));
    let mut sim = Simulator::with_parts(
        &Config::default(),
        Box::new(IdentityManager::new()),
        Box::new(memory),
    )
    .unwrap();
    let _ = sim.submit(read(0x40, 8)).unwrap();

    // Cycle 0 is reset; the AR is accepted and issued in cycle 1.
    while sim.cycle() < 2 + latency {
        sim.step().unwrap();
        assert!(!sim.engine.r_valid(), "completed early in cycle {}", sim.cycle() - 1);
    }
    assert_eq!(sim.engine.pending().len(), 1);
    sim.step().unwrap();
    assert!(sim.engine.r_valid());
    assert!(sim.engine.pending().is_empty());
}

#[test]
fn unwritten_memory_reads_as_zero() {
    let mut sim = Simulator::new(&Config::default()).unwrap();
    let r = sim.submit(read(0x1000, 8)).unwrap();
    let outcome = sim.run().unwrap();
    assert_eq!(
        outcome.replies,
        vec![UpstreamReply::Ack {
            request: r,
            data: Some(vec![0; 8])
        }]
    );
}

#[test]
fn preloaded_memory_through_custom_parts() {
    let mut memory = TimedMemory::new(Box::new(SimpleController::new(3)));
    memory.load(PhysAddr::new(0x200), &[1, 2, 3, 4]);
    let mut sim = Simulator::with_parts(
        &Config::default(),
        Box::new(IdentityManager::new()),
        Box::new(memory),
    )
    .unwrap();
    let r = sim.submit(read(0x200, 4)).unwrap();
    let outcome = sim.run().unwrap();
    assert_eq!(
        outcome.replies,
        vec![UpstreamReply::Ack {
            request: r,
            data: Some(vec![1, 2, 3, 4])
        }]
    );
}

#[test]
fn unmapped_page_is_reported_as_fault() {
    let mut config = Config::default();
    config.memory.manager = ManagerKind::Paged;
    let mut sim = Simulator::new(&config).unwrap();
    let r = sim.submit(read(0x5000, 8)).unwrap();

    let outcome = sim.run().unwrap();
    assert!(outcome.quiescent);
    assert_eq!(
        outcome.replies,
        vec![UpstreamReply::Fault {
            request: r,
            vaddr: VirtAddr::new(0x5000)
        }]
    );
    assert_eq!(sim.stats().get(Counter::AddressFaults), 1);
}

#[test]
fn demand_paging_with_dram_timing() {
    let mut config = Config::default();
    config.memory.manager = ManagerKind::Paged;
    config.memory.demand_paging = true;
    config.memory.interface = InterfaceKind::Dram;
    let mut sim = Simulator::new(&config).unwrap();
    let w = sim.submit(write(0x3000, vec![7; 8])).unwrap();
    let r = sim.submit(read(0x3000, 8)).unwrap();

    let outcome = sim.run().unwrap();
    assert!(outcome.quiescent);
    assert_eq!(
        outcome.replies,
        vec![
            UpstreamReply::Ack {
                request: w,
                data: None
            },
            UpstreamReply::Ack {
                request: r,
                data: Some(vec![7; 8])
            },
        ]
    );
}

#[test]
fn fence_is_counted_and_acknowledged() {
    let mut sim = Simulator::new(&Config::default()).unwrap();
    let _ = sim.submit(read(0, 8)).unwrap();
    let fence = sim.submit(UpstreamEvent::Fence).unwrap();
    let outcome = sim.run().unwrap();

    assert!(outcome.replies.contains(&UpstreamReply::Ack {
        request: fence,
        data: None
    }));
    assert_eq!(sim.stats().get(Counter::FenceRequests), 1);
}

#[test]
fn flush_is_counted_and_ordered_after_writes_to_its_line() {
    let mut sim = Simulator::new(&Config::default()).unwrap();
    let w = sim.submit(write(0x1008, vec![3; 8])).unwrap();
    let flush = sim
        .submit(UpstreamEvent::Flush {
            vaddr: VirtAddr::new(0x1030),
        })
        .unwrap();
    let outcome = sim.run().unwrap();

    let order: Vec<_> = outcome.replies.iter().map(UpstreamReply::request).collect();
    assert_eq!(order, vec![w, flush]);
    assert_eq!(sim.stats().get(Counter::FlushRequests), 1);
    assert_eq!(sim.stats().get(Counter::FenceRequests), 0);
}

#[test]
fn cycle_limit_leaves_work_unanswered() {
    let mut sim = Simulator::new(&Config::default()).unwrap();
    sim.set_max_cycles(4);
    let _ = sim.submit(read(0, 8)).unwrap();

    let outcome = sim.run().unwrap();
    assert!(!outcome.quiescent);
    assert_eq!(outcome.cycles, 4);
    assert!(outcome.replies.is_empty());
    assert_eq!(outcome.unanswered, 1);
    assert_eq!(outcome.pending, 1);
}

#[test]
fn reset_cycles_elapse_before_idle_run_ends() {
    let mut config = Config::default();
    config.general.reset_cycles = 5;
    let mut sim = Simulator::new(&config).unwrap();
    let outcome = sim.run().unwrap();
    assert!(outcome.quiescent);
    assert_eq!(outcome.cycles, 5);
    assert_eq!(sim.cycle(), 5);
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = Config::default();
    config.bridge.cache_line_size = 24;
    assert!(matches!(
        Simulator::new(&config),
        Err(ConfigError::InvalidLineSize(24))
    ));
}

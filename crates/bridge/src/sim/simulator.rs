//! Simulator: owns the engine and the upstream adapter side by side.
//!
//! One [`Simulator::step`] is one clock cycle:
//! 1. **Drive:** Sample the engine outputs, then let the adapter drive its inputs
//!    (or hold reset during the first `reset_cycles` cycles).
//! 2. **Tick:** Evaluate the engine on those inputs.
//! 3. **Observe:** Let the adapter apply the handshakes that fired and collect faults.
//! 4. **Complete:** Poll the memory interface and hand completions to the engine,
//!    strictly after the tick has returned.

use tracing::{info, warn};

use crate::bridge::signals::AxiInputs;
use crate::bridge::{
    AxiEngine, RequestId, UpstreamAdapter, UpstreamError, UpstreamEvent, UpstreamReply,
};
use crate::common::{BridgeError, PhysAddr};
use crate::config::{Config, ConfigError, InterfaceKind, ManagerKind};
use crate::mem::{
    DramController, IdentityManager, MemoryController, MemoryInterface, MemoryManager,
    PagedManager, SimpleController, TimedMemory,
};
use crate::stats::{BridgeStats, Counter};

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimOutcome {
    /// Cycles simulated, reset included.
    pub cycles: u64,
    /// `true` if everything submitted was answered before the cycle limit.
    pub quiescent: bool,
    /// Replies in the order they were produced.
    pub replies: Vec<UpstreamReply>,
    /// Logical requests still waiting on memory when the run ended.
    pub pending: usize,
    /// Events still queued or in flight at the adapter when the run ended.
    pub unanswered: usize,
}

/// Top-level simulator: engine, upstream adapter and memory collaborators.
#[derive(Debug)]
pub struct Simulator {
    /// The protocol engine.
    pub engine: AxiEngine,
    /// The bus master feeding the engine.
    pub adapter: UpstreamAdapter,
    cycle: u64,
    max_cycles: u64,
    reset_cycles: u64,
    clock_hz: u64,
    replies: Vec<UpstreamReply>,
}

impl Simulator {
    /// Builds a simulator with the memory collaborators selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration does not validate.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let mem = &config.memory;
        let manager: Box<dyn MemoryManager> = match mem.manager {
            ManagerKind::Identity => Box::new(
                mem.identity_limit
                    .map_or_else(IdentityManager::new, IdentityManager::with_limit),
            ),
            ManagerKind::Paged => {
                let paged = PagedManager::new(mem.page_size);
                Box::new(if mem.demand_paging {
                    paged.with_demand_paging(PhysAddr::new(mem.frame_base))
                } else {
                    paged
                })
            }
        };
        let controller: Box<dyn MemoryController> = match mem.interface {
            InterfaceKind::Simple => Box::new(SimpleController::new(mem.latency)),
            InterfaceKind::Dram => Box::new(
                DramController::new(mem.t_cas, mem.t_ras, mem.t_pre).with_row_bytes(mem.row_bytes),
            ),
        };
        Self::with_parts(config, manager, Box::new(TimedMemory::new(controller)))
    }

    /// Builds a simulator around caller-supplied memory collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration does not validate.
    pub fn with_parts(
        config: &Config,
        manager: Box<dyn MemoryManager>,
        memory: Box<dyn MemoryInterface>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut engine = AxiEngine::new(config.bridge.cache_line_size, manager, memory);
        engine.set_trace_signals(config.general.trace_signals);
        Ok(Self {
            engine,
            adapter: UpstreamAdapter::new(config.bridge.bus_width_bytes)
                .with_line_size(config.bridge.cache_line_size),
            cycle: 0,
            max_cycles: config.general.max_cycles,
            reset_cycles: config.general.reset_cycles,
            clock_hz: config.general.clock_hz()?,
            replies: Vec::new(),
        })
    }

    /// Overrides the cycle limit.
    pub const fn set_max_cycles(&mut self, max_cycles: u64) {
        self.max_cycles = max_cycles;
    }

    /// Queues an upstream event.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the event cannot be carried by one burst.
    pub fn submit(&mut self, event: UpstreamEvent) -> Result<RequestId, UpstreamError> {
        let counter = match event {
            UpstreamEvent::Flush { .. } => Some(Counter::FlushRequests),
            UpstreamEvent::Fence => Some(Counter::FenceRequests),
            UpstreamEvent::Read { .. } | UpstreamEvent::Write { .. } => None,
        };
        let request = self.adapter.submit(event)?;
        if let Some(counter) = counter {
            self.engine.stats_mut().increment(counter, 1);
        }
        Ok(request)
    }

    /// Simulates one clock cycle.
    ///
    /// # Errors
    ///
    /// Returns the engine's fatal error; the simulator must not be stepped again.
    pub fn step(&mut self) -> Result<(), BridgeError> {
        let outputs = self.engine.outputs();
        let in_reset = self.cycle < self.reset_cycles;
        let inputs = if in_reset {
            AxiInputs::reset()
        } else {
            self.adapter.drive()
        };

        self.engine.tick(self.cycle, &inputs)?;

        if !in_reset {
            self.adapter.observe(&inputs, &outputs);
        }
        for fault in self.engine.take_faults() {
            self.adapter.on_fault(&fault);
        }
        let _ = self.engine.drain_memory(self.cycle)?;
        self.replies.extend(self.adapter.take_replies());
        self.cycle += 1;
        Ok(())
    }

    /// `true` when every submitted event is answered and nothing is in flight.
    pub fn is_quiescent(&self) -> bool {
        self.adapter.is_idle() && self.engine.is_quiescent()
    }

    /// Steps until quiescent or until the cycle limit.
    ///
    /// # Errors
    ///
    /// Returns the first fatal engine error.
    pub fn run(&mut self) -> Result<SimOutcome, BridgeError> {
        while self.cycle < self.max_cycles {
            if self.cycle >= self.reset_cycles && self.is_quiescent() {
                break;
            }
            self.step()?;
        }
        let quiescent = self.is_quiescent();
        let outcome = SimOutcome {
            cycles: self.cycle,
            quiescent,
            replies: std::mem::take(&mut self.replies),
            pending: self.engine.pending().len(),
            unanswered: self.adapter.queued() + self.adapter.in_flight(),
        };
        if quiescent {
            info!(cycles = outcome.cycles, replies = outcome.replies.len(), "run complete");
        } else {
            warn!(
                cycles = outcome.cycles,
                pending = outcome.pending,
                unanswered = outcome.unanswered,
                "cycle limit reached before quiescence"
            );
        }
        Ok(outcome)
    }

    /// Cycles simulated so far.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Clock frequency used for the statistics report.
    pub const fn clock_hz(&self) -> u64 {
        self.clock_hz
    }

    /// Counters recorded so far.
    pub const fn stats(&self) -> &BridgeStats {
        self.engine.stats()
    }
}

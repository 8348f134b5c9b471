//! Request splitting and address translation.
//!
//! A bus request may straddle cache lines; the memory hierarchy only accepts requests
//! that stay inside one line. The splitter:
//! 1. **Partitions** `[vaddr, vaddr + len)` into maximal runs that never cross a line
//!    boundary (and, for writes, never include a byte whose strobe was low).
//! 2. **Translates** the start of every run through the memory manager.
//!
//! Translation of every run happens before anything is registered or issued, so a
//! fault on any run abandons the whole request with nothing left in flight.
//!
//! Partitioning is ceiling-aligned: the first run ends at the first line boundary
//! strictly above the start address, so a request that begins exactly on a boundary
//! opens with a full line.

use tracing::debug;

use super::transaction::BusRequest;
use crate::common::{Fault, PhysAddr, VirtAddr};
use crate::mem::MemoryManager;

/// A contiguous byte range of a request, relative to its start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    /// Offset of the first byte within the request.
    pub offset: u64,
    /// Bytes covered.
    pub len: u64,
}

/// A run with its translated start address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranslatedRun {
    /// Position within the request.
    pub run: Run,
    /// Physical address of the run's first byte.
    pub paddr: PhysAddr,
}

/// Result of splitting one request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitPlan {
    /// Runs in address order.
    pub runs: Vec<TranslatedRun>,
    /// Cache lines between the first and the last enabled byte, both included.
    pub lines: u64,
}

impl SplitPlan {
    /// Line boundaries the request crosses; what the split statistics count.
    ///
    /// Runs broken only by disabled strobe bytes inside one line do not count.
    pub const fn extra_splits(&self) -> u64 {
        self.lines.saturating_sub(1)
    }

    /// `true` when nothing needs to be issued (zero length or every byte disabled).
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Partitions `len` bytes at `vaddr` into line-bounded runs.
///
/// With `enables`, runs also break at disabled bytes and disabled bytes are skipped.
/// `line` must be a power of two.
pub fn partition(vaddr: VirtAddr, len: u64, line: u64, enables: Option<&[bool]>) -> Vec<Run> {
    let enabled = |offset: u64| {
        enables.is_none_or(|en| en.get(offset as usize).copied().unwrap_or(false))
    };
    let mut runs = Vec::new();
    let mut offset = 0;
    while offset < len {
        if !enabled(offset) {
            offset += 1;
            continue;
        }
        let addr = VirtAddr::new(vaddr.val().wrapping_add(offset));
        let limit = addr.bytes_to_boundary(line).min(len - offset);
        let mut run_len = 1;
        while run_len < limit && enabled(offset + run_len) {
            run_len += 1;
        }
        runs.push(Run {
            offset,
            len: run_len,
        });
        offset += run_len;
    }
    runs
}

/// Splits requests on `line_size` boundaries and translates each piece.
#[derive(Clone, Copy, Debug)]
pub struct Splitter {
    line_size: u64,
}

impl Splitter {
    /// Creates a splitter for a power-of-two `line_size`.
    pub fn new(line_size: u64) -> Self {
        debug_assert!(line_size.is_power_of_two());
        Self { line_size }
    }

    /// Alignment granularity in bytes.
    pub const fn line_size(&self) -> u64 {
        self.line_size
    }

    /// Partitions and translates `req`.
    ///
    /// # Errors
    ///
    /// Returns the first translation fault. A request whose last byte would lie past
    /// the top of the address space faults with [`Fault::OutOfRange`].
    pub fn split(&self, req: &BusRequest, mm: &mut dyn MemoryManager) -> Result<SplitPlan, Fault> {
        if req.len > 0 && req.vaddr.checked_add(req.len - 1).is_none() {
            return Err(Fault::OutOfRange { vaddr: req.vaddr });
        }
        let enables = req.payload.as_ref().map(|p| p.enables.as_slice());
        let runs = partition(req.vaddr, req.len, self.line_size, enables)
            .into_iter()
            .map(|run| {
                let vaddr = VirtAddr::new(req.vaddr.val() + run.offset);
                mm.resolve(vaddr).map(|paddr| TranslatedRun { run, paddr })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let lines = match (runs.first(), runs.last()) {
            (Some(first), Some(last)) => {
                let start = req.vaddr.val() + first.run.offset;
                let end = req.vaddr.val() + last.run.offset + last.run.len - 1;
                end / self.line_size - start / self.line_size + 1
            }
            _ => 0,
        };
        if runs.len() > 1 {
            debug!(
                id = req.axi_id,
                kind = %req.kind,
                vaddr = %req.vaddr,
                len = req.len,
                pieces = runs.len(),
                lines,
                "split into pieces"
            );
        }
        Ok(SplitPlan { runs, lines })
    }
}

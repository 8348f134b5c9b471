//! Virtual-to-physical address resolution.
//!
//! The bridge never caches translations: every sub-request is resolved through the
//! injected [`MemoryManager`] at split time. Two managers are provided:
//! 1. **IdentityManager:** physical equals virtual, with an optional upper bound.
//! 2. **PagedManager:** a flat page table with optional demand paging.

use std::collections::HashMap;

use tracing::debug;

use crate::common::{Fault, PhysAddr, VirtAddr};

/// Capability that resolves bus addresses to physical addresses.
pub trait MemoryManager {
    /// Resolves `vaddr` to a physical address.
    ///
    /// # Errors
    ///
    /// Returns a [`Fault`] if the address has no translation.
    fn resolve(&mut self, vaddr: VirtAddr) -> Result<PhysAddr, Fault>;
}

/// Identity translation; addresses at or above `limit` fault.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityManager {
    limit: Option<u64>,
}

impl IdentityManager {
    /// Identity translation over the whole 64-bit space.
    pub const fn new() -> Self {
        Self { limit: None }
    }

    /// Identity translation for addresses below `limit`.
    pub const fn with_limit(limit: u64) -> Self {
        Self { limit: Some(limit) }
    }
}

impl MemoryManager for IdentityManager {
    fn resolve(&mut self, vaddr: VirtAddr) -> Result<PhysAddr, Fault> {
        match self.limit {
            Some(limit) if vaddr.val() >= limit => Err(Fault::OutOfRange { vaddr }),
            _ => Ok(PhysAddr::new(vaddr.val())),
        }
    }
}

/// Page-table translation.
///
/// Maps virtual page numbers to physical frame numbers. With demand paging enabled,
/// an unmapped page is given the next free frame on first touch instead of faulting.
#[derive(Clone, Debug)]
pub struct PagedManager {
    page_size: u64,
    table: HashMap<u64, u64>,
    next_frame: Option<u64>,
}

impl PagedManager {
    /// Creates an empty page table. `page_size` must be a power of two.
    pub fn new(page_size: u64) -> Self {
        debug_assert!(page_size.is_power_of_two());
        Self {
            page_size,
            table: HashMap::new(),
            next_frame: None,
        }
    }

    /// Enables demand paging, allocating frames upward from physical address `frame_base`.
    #[must_use]
    pub fn with_demand_paging(mut self, frame_base: PhysAddr) -> Self {
        self.next_frame = Some(frame_base.val() / self.page_size);
        self
    }

    /// Maps the page containing `vaddr` onto the frame containing `paddr`.
    ///
    /// Returns the frame number previously mapped for that page, if any.
    pub fn map(&mut self, vaddr: VirtAddr, paddr: PhysAddr) -> Option<u64> {
        self.table
            .insert(vaddr.page_number(self.page_size), paddr.val() / self.page_size)
    }

    /// Removes the mapping for the page containing `vaddr`.
    pub fn unmap(&mut self, vaddr: VirtAddr) -> Option<u64> {
        self.table.remove(&vaddr.page_number(self.page_size))
    }

    /// Number of mapped pages.
    pub fn mapped_pages(&self) -> usize {
        self.table.len()
    }

    /// Page size in bytes.
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }
}

impl MemoryManager for PagedManager {
    fn resolve(&mut self, vaddr: VirtAddr) -> Result<PhysAddr, Fault> {
        let vpn = vaddr.page_number(self.page_size);
        let frame = if let Some(&frame) = self.table.get(&vpn) {
            frame
        } else if let Some(next) = self.next_frame.as_mut() {
            let frame = *next;
            *next += 1;
            let _ = self.table.insert(vpn, frame);
            debug!(vpn, frame, "demand-mapped page");
            frame
        } else {
            return Err(Fault::Unmapped { vaddr });
        };
        frame
            .checked_mul(self.page_size)
            .and_then(|base| base.checked_add(vaddr.offset_in(self.page_size)))
            .map(PhysAddr::new)
            .ok_or(Fault::OutOfRange { vaddr })
    }
}

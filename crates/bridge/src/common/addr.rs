//! Physical and Virtual Address types.
//!
//! This module defines strong types for physical and virtual addresses so that an
//! untranslated bus address can never be handed to the memory interface by accident.
//! It provides the following:
//! 1. **Type Safety:** Distinguishes between virtual and physical address spaces at compile time.
//! 2. **Line Arithmetic:** Cache-line offset and boundary helpers used by the request splitter.
//! 3. **Page Arithmetic:** Page number/offset helpers used by the paged memory manager.

use std::fmt;

/// A virtual address as seen on the AXI address channels.
///
/// Virtual addresses must be resolved by a memory manager before they reach the
/// memory interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VirtAddr(pub u64);

/// A physical address in the memory hierarchy's address space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PhysAddr(pub u64);

impl VirtAddr {
    /// Creates a new virtual address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Returns the address `bytes` further on, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, bytes: u64) -> Option<Self> {
        match self.0.checked_add(bytes) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }

    /// Byte offset of this address within a naturally aligned block of `size` bytes.
    ///
    /// `size` must be a power of two.
    #[inline]
    pub const fn offset_in(&self, size: u64) -> u64 {
        self.0 & (size - 1)
    }

    /// Number of bytes from this address up to (and excluding) the next
    /// `size`-aligned boundary strictly above it.
    ///
    /// An address that sits exactly on a boundary has a full block ahead of it.
    #[inline]
    pub const fn bytes_to_boundary(&self, size: u64) -> u64 {
        size - self.offset_in(size)
    }

    /// Page number for a power-of-two `page_size`.
    #[inline]
    pub const fn page_number(&self, page_size: u64) -> u64 {
        self.0 / page_size
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "va:{:#x}", self.0)
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pa:{:#x}", self.0)
    }
}

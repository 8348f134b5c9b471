//! Memory Manager Tests.
//!
//! Identity and paged translation as seen through the capability trait.

use rtlbridge_core::common::{Fault, PhysAddr, VirtAddr};
use rtlbridge_core::mem::{IdentityManager, MemoryManager, PagedManager};

fn resolve(mm: &mut dyn MemoryManager, addr: u64) -> Result<u64, Fault> {
    mm.resolve(VirtAddr::new(addr)).map(|p| p.val())
}

#[test]
fn identity_is_transparent() {
    let mut mm = IdentityManager::new();
    assert_eq!(resolve(&mut mm, 0), Ok(0));
    assert_eq!(resolve(&mut mm, u64::MAX), Ok(u64::MAX));
}

#[test]
fn identity_limit_is_exclusive() {
    let mut mm = IdentityManager::with_limit(0x100);
    assert_eq!(resolve(&mut mm, 0xFF), Ok(0xFF));
    assert_eq!(
        resolve(&mut mm, 0x100),
        Err(Fault::OutOfRange {
            vaddr: VirtAddr::new(0x100)
        })
    );
}

#[test]
fn paged_remap_returns_previous_frame() {
    let mut mm = PagedManager::new(4096);
    assert_eq!(mm.map(VirtAddr::new(0x1000), PhysAddr::new(0x5000)), None);
    assert_eq!(mm.map(VirtAddr::new(0x1FFF), PhysAddr::new(0x8000)), Some(5));
    assert_eq!(resolve(&mut mm, 0x1010), Ok(0x8010));
}

#[test]
fn paged_unmap_faults_again() {
    let mut mm = PagedManager::new(4096);
    let _ = mm.map(VirtAddr::new(0x3000), PhysAddr::new(0x3000));
    assert!(resolve(&mut mm, 0x3000).is_ok());
    assert_eq!(mm.unmap(VirtAddr::new(0x3ABC)), Some(3));
    assert_eq!(
        resolve(&mut mm, 0x3000),
        Err(Fault::Unmapped {
            vaddr: VirtAddr::new(0x3000)
        })
    );
    assert_eq!(mm.mapped_pages(), 0);
}

#[test]
fn fault_reports_its_address() {
    let fault = Fault::Unmapped {
        vaddr: VirtAddr::new(0x42),
    };
    assert_eq!(fault.vaddr(), VirtAddr::new(0x42));
    assert_eq!(fault.to_string(), "unmapped address va:0x42");
}

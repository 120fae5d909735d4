//! # Virtual and Physical Memory Address Types
//!
//! Strongly typed wrappers for raw memory addresses and 4 KiB frame bases
//! used in paging and memory management code.
//!
//! ## Overview
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`PhysicalAddress`] | A byte address in physical memory (RAM or MMIO). |
//! | [`VirtualAddress`] | A byte address translated through the page tables. |
//! | [`PhysicalFrame`] | The page-aligned base of a 4 KiB physical frame. |
//!
//! All three are `#[repr(transparent)]` wrappers around `u64`, so mixing up
//! physical and virtual addresses is a type error rather than a silent bug.
//!
//! ## Translation Indices
//!
//! A canonical 48-bit virtual address splits into four 9-bit table indices
//! and a 12-bit offset:
//!
//! ```text
//! | 47‒39 | 38‒30 | 29‒21 | 20‒12 | 11‒0   |
//! |  PML4 |  PDPT |   PD  |   PT  | Offset |
//! ```
//!
//! [`VirtualAddress::table_indices`] returns the indices top level first.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x0030_0042);
//! let frame = PhysicalFrame::containing(pa);
//! assert_eq!(frame.base().as_u64(), 0x0030_0000);
//! assert_eq!(frame.number(), 0x300);
//!
//! let va = VirtualAddress::new(0xffff_8000_0020_1000);
//! assert_eq!(va.table_indices(), [256, 0, 1, 1]);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod physical_address;
mod physical_frame;
mod virtual_address;

pub use crate::physical_address::PhysicalAddress;
pub use crate::physical_frame::PhysicalFrame;
pub use crate::virtual_address::VirtualAddress;

/// Frame and page size in bytes.
pub const PAGE_SIZE: u64 = 4096;

/// Mask selecting the in-page offset bits.
pub const PAGE_OFFSET_MASK: u64 = PAGE_SIZE - 1;

/// Number of index bits per translation level.
pub const INDEX_BITS: u32 = 9;

/// Number of translation levels.
pub const LEVELS: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_roundtrips_through_number() {
        let frame = PhysicalFrame::containing(PhysicalAddress::new(0x0012_3456));
        assert_eq!(frame.base().as_u64(), 0x0012_3000);
        assert_eq!(PhysicalFrame::from_number(frame.number()), frame);
    }

    #[test]
    fn from_aligned_rejects_unaligned_addresses() {
        assert!(PhysicalFrame::from_aligned(PhysicalAddress::new(0x1001)).is_none());
        assert!(PhysicalFrame::from_aligned(PhysicalAddress::new(0x2000)).is_some());
    }

    #[test]
    fn indices_cover_all_levels() {
        let va = VirtualAddress::new(0x0000_7fff_ffff_f123);
        assert_eq!(va.table_indices(), [255, 511, 511, 511]);
        assert_eq!(va.page_offset(), 0x123);
    }

    #[test]
    fn kernel_half_starts_at_slot_256() {
        let va = VirtualAddress::new(0xffff_8000_0000_0000);
        assert_eq!(va.table_indices()[0], 256);
        assert!(!va.is_lower_half());
        assert!(VirtualAddress::new(0x1000).is_lower_half());
    }
}

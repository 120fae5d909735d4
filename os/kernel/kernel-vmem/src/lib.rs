//! # Virtual Memory Support
//!
//! Per-process x86-64 page tables built over allocator-supplied frames.
//!
//! ## What you get
//! - An [`AddressSpace`] handle describing one `PML4` root and its window.
//! - A [`Frame`] type: 4 KiB of physical memory, readable as a table of
//!   512 [`PageTableEntry`] values.
//! - [`MapFlags`] for the present / writable / user bits callers control.
//! - The seams the manager allocates and reaches memory through
//!   ([`FrameAlloc`], [`PhysMapper`]) plus [`FrameArena`], a heap-backed
//!   physical memory for hosted use.
//!
//! ## x86-64 Virtual Address → Physical Address Walk
//!
//! Each 48-bit virtual address is divided into five fields:
//!
//! ```text
//! | 47‒39 | 38‒30 | 29‒21 | 20‒12 | 11‒0   |
//! |  PML4 |  PDPT |   PD  |   PT  | Offset |
//! ```
//!
//! ```text
//!  PML4  →  PDPT  →  PD  →  PT  →  Physical Page
//!   │        │        │        │
//!   │        │        │        └───► PTE   maps one 4 KiB frame
//!   │        │        └────────────► PDE   points to a PT
//!   │        └─────────────────────► PDPTE points to a PD
//!   └──────────────────────────────► PML4E points to a PDPT
//! ```
//!
//! Only 4 KiB leaves are ever created. Huge-page entries may exist in the
//! kernel window when it was inherited from firmware; the walk recognizes
//! them on lookup but never maps through them.
//!
//! ## Windows
//!
//! | PML4 slots | Window | Owned by |
//! |------------|--------|----------|
//! | `0..256`   | user (lower half) | the process space |
//! | `256..512` | kernel (upper half) | the kernel space, copied into every process root at creation |
//!
//! A process space only ever maps inside its user window, so the copied
//! kernel entries are never altered by per-process mapping calls.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

extern crate alloc;

mod address_space;
mod arena;
mod error;
mod page_table;

pub use crate::address_space::{AddressSpace, SpaceKind, Translation};
pub use crate::arena::FrameArena;
pub use crate::error::MapError;
pub use crate::page_table::{MapFlags, PageTableEntry};
use kernel_info::memory::{PAGE_SIZE, TABLE_ENTRIES};
use kernel_memory_addresses::PhysicalFrame;

/// Re-export constants as info module.
pub use kernel_info::memory as info;

/// Source of physical 4 KiB frames.
///
/// The implementation decides where frames come from (bitmap, bump pointer,
/// test pool). Frames are handed out uninitialized; callers zero what they
/// use as tables.
pub trait FrameAlloc {
    /// Allocate one frame, or `None` when exhausted.
    fn alloc_4k(&mut self) -> Option<PhysicalFrame>;

    /// Return a frame previously handed out by [`alloc_4k`](Self::alloc_4k).
    fn free_4k(&mut self, frame: PhysicalFrame);
}

/// Access to physical memory one frame at a time.
///
/// - **Kernel**: the frame lives at `HHDM_BASE + base` in the direct map.
/// - **Hosted**: [`FrameArena`] keeps frames on the heap.
pub trait PhysMapper {
    fn frame(&self, frame: PhysicalFrame) -> &Frame;

    fn frame_mut(&mut self, frame: PhysicalFrame) -> &mut Frame;
}

const FRAME_BYTES: usize = PAGE_SIZE as usize;

/// One 4 KiB physical frame.
///
/// When a frame holds a page table, it is read as 512 little-endian `u64`
/// entries; traversal is index arithmetic on the frame, not pointer chasing.
#[repr(C, align(4096))]
#[derive(Clone)]
pub struct Frame([u8; FRAME_BYTES]);

impl Frame {
    #[must_use]
    pub const fn zeroed() -> Self {
        Self([0; FRAME_BYTES])
    }

    #[inline]
    pub fn zero(&mut self) {
        self.0.fill(0);
    }

    #[inline]
    #[must_use]
    pub const fn bytes(&self) -> &[u8; FRAME_BYTES] {
        &self.0
    }

    #[inline]
    pub const fn bytes_mut(&mut self) -> &mut [u8; FRAME_BYTES] {
        &mut self.0
    }

    /// Read table entry `index` (`0..512`).
    #[inline]
    #[must_use]
    pub fn entry(&self, index: usize) -> PageTableEntry {
        debug_assert!(index < TABLE_ENTRIES);
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.0[index * 8..index * 8 + 8]);
        PageTableEntry::from_bits(u64::from_le_bytes(raw))
    }

    /// Write table entry `index` (`0..512`).
    #[inline]
    pub fn set_entry(&mut self, index: usize, entry: PageTableEntry) {
        debug_assert!(index < TABLE_ENTRIES);
        self.0[index * 8..index * 8 + 8].copy_from_slice(&entry.into_bits().to_le_bytes());
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let used = (0..TABLE_ENTRIES)
            .filter(|&i| self.entry(i).into_bits() != 0)
            .count();
        write!(f, "Frame {{ nonzero_words: {used} }}")
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::FrameAlloc;
    use alloc::vec::Vec;
    use kernel_memory_addresses::PhysicalFrame;

    /// A trivial **bump** allocator that remembers what is returned to it.
    pub struct BumpAlloc {
        next: u64,
        end: u64,
        pub freed: Vec<PhysicalFrame>,
    }

    impl BumpAlloc {
        pub fn new(first_frame: u64, frames: u64) -> Self {
            Self {
                next: first_frame,
                end: first_frame + frames,
                freed: Vec::new(),
            }
        }

        /// Next frame number to be handed out.
        pub const fn handed_out(&self) -> u64 {
            self.next
        }
    }

    impl FrameAlloc for BumpAlloc {
        fn alloc_4k(&mut self) -> Option<PhysicalFrame> {
            if self.next >= self.end {
                return None;
            }
            let f = PhysicalFrame::from_number(self.next);
            self.next += 1;
            Some(f)
        }

        fn free_4k(&mut self, frame: PhysicalFrame) {
            self.freed.push(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_little_endian_words() {
        let mut frame = Frame::zeroed();
        let e = PageTableEntry::new().with_present(true).with_writable(true);
        frame.set_entry(3, e);
        assert_eq!(frame.bytes()[24], 0b11);
        assert_eq!(frame.entry(3), e);
        assert_eq!(frame.entry(4).into_bits(), 0);
    }

    #[test]
    fn frame_is_page_sized_and_aligned() {
        assert_eq!(core::mem::align_of::<Frame>(), 4096);
        assert_eq!(core::mem::size_of::<Frame>(), 4096);
    }
}

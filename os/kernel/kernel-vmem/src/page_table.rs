use bitfield_struct::bitfield;
use kernel_memory_addresses::PhysicalFrame;

/// One 64-bit x86-64 paging entry, valid at every level.
///
/// | Bits  | Name | Meaning |
/// |-------|------|---------|
/// | 0     | `P`   | Present |
/// | 1     | `RW`  | Writable |
/// | 2     | `US`  | User accessible |
/// | 3     | `PWT` | Write-through |
/// | 4     | `PCD` | Cache disable |
/// | 5     | `A`   | Accessed |
/// | 6     | `D`   | Dirty (leaf only) |
/// | 7     | `PS`  | Huge page (PDPTE/PDE only) |
/// | 8     | `G`   | Global (leaf only) |
/// | 9–11  |       | OS available |
/// | 12–51 |       | Frame number |
/// | 52–62 |       | OS available / PKU |
/// | 63    | `NX`  | Execute disable |
///
/// ### Example
/// ```rust
/// # use kernel_vmem::{MapFlags, PageTableEntry};
/// # use kernel_memory_addresses::PhysicalFrame;
/// let e = PageTableEntry::leaf(PhysicalFrame::from_number(0x300), MapFlags::WRITABLE);
/// assert!(e.present() && e.writable() && !e.user());
/// assert_eq!(e.frame(), Some(PhysicalFrame::from_number(0x300)));
/// ```
#[bitfield(u64)]
#[derive(Eq, PartialEq)]
pub struct PageTableEntry {
    pub present: bool,
    pub writable: bool,
    pub user: bool,
    pub write_through: bool,
    pub cache_disable: bool,
    pub accessed: bool,
    pub dirty: bool,
    pub huge: bool,
    pub global: bool,
    #[bits(3)]
    pub available: u8,
    /// Physical frame number (`base >> 12`).
    #[bits(40)]
    frame_number: u64,
    #[bits(11)]
    __: u16,
    pub no_execute: bool,
}

impl PageTableEntry {
    /// Entry linking to a next-level table.
    ///
    /// Intermediate entries are always present and writable; the leaf decides
    /// the effective permission. `user` must be set on every level of a
    /// user-window walk or the CPU denies user access regardless of the leaf.
    #[inline]
    #[must_use]
    pub const fn table(next: PhysicalFrame, user: bool) -> Self {
        Self::new()
            .with_present(true)
            .with_writable(true)
            .with_user(user)
            .with_frame_number(next.number())
    }

    /// Leaf entry for a 4 KiB page. `PRESENT` is always added.
    #[inline]
    #[must_use]
    pub const fn leaf(frame: PhysicalFrame, flags: MapFlags) -> Self {
        Self::from_bits(frame.base().as_u64() | flags.union(MapFlags::PRESENT).bits())
    }

    /// The referenced frame, if present.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> Option<PhysicalFrame> {
        if self.present() {
            Some(PhysicalFrame::from_number(self.frame_number()))
        } else {
            None
        }
    }

    /// The caller-controlled permission bits.
    #[inline]
    #[must_use]
    pub const fn map_flags(&self) -> MapFlags {
        MapFlags::from_bits_truncate(self.into_bits())
    }
}

bitflags::bitflags! {
    /// Permission bits a mapping request may carry.
    ///
    /// Values match the hardware entry bits so the syscall ABI can pass them
    /// through unchanged. Any other bit is rejected.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct MapFlags: u64 {
        /// Page is present; added implicitly to every leaf.
        const PRESENT  = 1 << 0;

        /// Writes are allowed.
        const WRITABLE = 1 << 1;

        /// Accessible from CPL 3.
        const USER     = 1 << 2;
    }
}

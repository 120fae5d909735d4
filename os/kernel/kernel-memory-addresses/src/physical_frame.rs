use crate::{PAGE_OFFSET_MASK, PhysicalAddress};
use core::fmt;

/// Base of a 4 KiB physical frame.
///
/// ### Invariants
/// - The low 12 bits of the base are always zero.
///
/// ### Examples
/// ```rust
/// # use kernel_memory_addresses::*;
/// let frame = PhysicalFrame::from_number(0x100);
/// assert_eq!(frame.base(), PhysicalAddress::new(0x10_0000));
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalFrame(u64);

impl PhysicalFrame {
    /// The frame that contains `pa` (aligns down).
    #[inline]
    #[must_use]
    pub const fn containing(pa: PhysicalAddress) -> Self {
        Self(pa.as_u64() & !PAGE_OFFSET_MASK)
    }

    /// The frame starting at `pa`, or `None` if `pa` is not 4 KiB aligned.
    #[inline]
    #[must_use]
    pub const fn from_aligned(pa: PhysicalAddress) -> Option<Self> {
        if pa.is_page_aligned() {
            Some(Self(pa.as_u64()))
        } else {
            None
        }
    }

    /// The frame with the given frame number (`base >> 12`).
    #[inline]
    #[must_use]
    pub const fn from_number(number: u64) -> Self {
        Self(number << 12)
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0)
    }

    /// Frame number as stored in page-table entries.
    #[inline]
    #[must_use]
    pub const fn number(self) -> u64 {
        self.0 >> 12
    }

    /// Combine with an in-frame offset.
    #[inline]
    #[must_use]
    pub const fn join(self, offset: u64) -> PhysicalAddress {
        PhysicalAddress::new(self.0 | (offset & PAGE_OFFSET_MASK))
    }
}

impl fmt::Debug for PhysicalFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalFrame({:#018X})", self.0)
    }
}

impl fmt::Display for PhysicalFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}/4K", self.0)
    }
}

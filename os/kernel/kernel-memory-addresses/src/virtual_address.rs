use crate::{INDEX_BITS, LEVELS, PAGE_OFFSET_MASK, PAGE_SIZE};
use core::fmt;

/// A virtual byte address.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualAddress(u64);

impl VirtualAddress {
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// `true` if the address is the base of a 4 KiB page.
    #[inline]
    #[must_use]
    pub const fn is_page_aligned(self) -> bool {
        self.0 & PAGE_OFFSET_MASK == 0
    }

    /// Offset of this address within its 4 KiB page.
    #[inline]
    #[must_use]
    pub const fn page_offset(self) -> u64 {
        self.0 & PAGE_OFFSET_MASK
    }

    /// Align down to the containing 4 KiB page.
    #[inline]
    #[must_use]
    pub const fn page_base(self) -> Self {
        Self(self.0 & !PAGE_OFFSET_MASK)
    }

    /// Base of the following 4 KiB page, or `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn next_page(self) -> Option<Self> {
        match self.page_base().0.checked_add(PAGE_SIZE) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked byte offset.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, bytes: u64) -> Option<Self> {
        match self.0.checked_add(bytes) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// `true` for addresses in the lower canonical half (bit 47 clear, upper bits zero).
    #[inline]
    #[must_use]
    pub const fn is_lower_half(self) -> bool {
        self.0 >> 47 == 0
    }

    /// Table indices for the four translation levels, top level (PML4) first.
    ///
    /// Each index is the 9-bit field `(va >> (12 + 9 * (3 - level))) & 0x1ff`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn table_indices(self) -> [usize; LEVELS] {
        let mask = (1u64 << INDEX_BITS) - 1;
        [
            ((self.0 >> 39) & mask) as usize,
            ((self.0 >> 30) & mask) as usize,
            ((self.0 >> 21) & mask) as usize,
            ((self.0 >> 12) & mask) as usize,
        ]
    }
}

impl fmt::Debug for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtualAddress(0x{:016X})", self.0)
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<VirtualAddress> for u64 {
    #[inline]
    fn from(value: VirtualAddress) -> Self {
        value.0
    }
}

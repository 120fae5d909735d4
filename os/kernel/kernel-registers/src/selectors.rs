//! # Segment selectors for long mode
//!
//! ```text
//!  15            3 2  1  0
//! +----------------+--+----+
//! |   Index[12:0]  |TI| RPL|
//! +----------------+--+----+  (TI=0 → GDT, TI=1 → LDT; RPL=0..3)
//! ```
//!
//! The GDT layout is fixed: index 1 is kernel code, 2 kernel data,
//! 3 user code and 4 user data.

use bitfield_struct::bitfield;

/// Requested privilege level carried in the low two selector bits.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum Rpl {
    Ring0 = 0,
    Ring1 = 1,
    Ring2 = 2,
    Ring3 = 3,
}

impl Rpl {
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Ring0,
            1 => Self::Ring1,
            2 => Self::Ring2,
            _ => Self::Ring3,
        }
    }

    #[inline]
    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }
}

/// Raw 16-bit selector encoding.
#[bitfield(u16)]
#[derive(Eq, PartialEq)]
pub struct SegmentSelector {
    /// Requested Privilege Level (bits 0..1).
    #[bits(2)]
    pub rpl: Rpl,
    /// Table Indicator (bit 2): 0 = GDT, 1 = LDT.
    pub ldt: bool,
    /// Descriptor index (bits 3..15).
    #[bits(13)]
    pub index: u16,
}

impl SegmentSelector {
    /// A GDT selector for `index` at privilege `rpl`.
    #[inline]
    #[must_use]
    pub const fn gdt(index: u16, rpl: Rpl) -> Self {
        Self::new().with_index(index).with_rpl(rpl)
    }

    /// Value as pushed into an `iretq` frame.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.into_bits() as u64
    }
}

/// Kernel code, `0x08`.
pub const KERNEL_CS: SegmentSelector = SegmentSelector::gdt(1, Rpl::Ring0);
/// Kernel data/stack, `0x10`.
pub const KERNEL_SS: SegmentSelector = SegmentSelector::gdt(2, Rpl::Ring0);
/// User code, `0x1B`.
pub const USER_CS: SegmentSelector = SegmentSelector::gdt(3, Rpl::Ring3);
/// User data/stack, `0x23`.
pub const USER_SS: SegmentSelector = SegmentSelector::gdt(4, Rpl::Ring3);

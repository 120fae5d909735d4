use bitfield_struct::bitfield;
use kernel_memory_addresses::{PhysicalAddress, PhysicalFrame};

/// CR3: Page-Map Level-4 Base Register (PCID disabled).
///
/// Only the frame number of the root table is meaningful here; the cache
/// control bits stay clear.
#[bitfield(u64)]
pub struct Cr3 {
    /// Bits 0–2, reserved.
    #[bits(3)]
    __: u8,

    /// Bit 3, PWT: page-level write-through for the root walk.
    pub pwt: bool,

    /// Bit 4, PCD: page-level cache disable for the root walk.
    pub pcd: bool,

    /// Bits 5–11, reserved.
    #[bits(7)]
    __: u8,

    /// Bits 12–51, physical frame number of the root table.
    #[bits(40)]
    root_number: u64,

    /// Bits 52–63, reserved.
    #[bits(12)]
    __: u16,
}

impl Cr3 {
    /// CR3 value selecting `root` as the top-level table.
    #[must_use]
    pub const fn from_root(root: PhysicalFrame) -> Self {
        Self::new().with_root_number(root.number())
    }

    /// Frame holding the top-level table.
    #[must_use]
    pub const fn root(&self) -> PhysicalFrame {
        PhysicalFrame::from_number(self.root_number())
    }

    /// Physical base of the top-level table.
    #[must_use]
    pub const fn root_address(&self) -> PhysicalAddress {
        self.root().base()
    }
}

#[cfg(all(feature = "asm", target_arch = "x86_64"))]
impl crate::LoadRegisterUnsafe for Cr3 {
    unsafe fn load_unsafe() -> Self {
        let cr3: u64;
        unsafe {
            core::arch::asm!("mov {}, cr3", out(reg) cr3, options(nomem, nostack, preserves_flags));
        }
        Self::from_bits(cr3)
    }
}

#[cfg(all(feature = "asm", target_arch = "x86_64"))]
impl crate::StoreRegisterUnsafe for Cr3 {
    unsafe fn store_unsafe(self) {
        let cr3 = self.into_bits();
        unsafe {
            core::arch::asm!("mov cr3, {}", in(reg) cr3, options(nostack, preserves_flags));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_survives_encoding() {
        let root = PhysicalFrame::from_number(0x1234);
        let cr3 = Cr3::from_root(root);
        assert_eq!(cr3.into_bits(), 0x0123_4000);
        assert_eq!(cr3.root(), root);
        assert!(!cr3.pwt() && !cr3.pcd());
    }
}

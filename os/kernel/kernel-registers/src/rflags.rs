use bitfield_struct::bitfield;

/// The RFLAGS bits a freshly created execution context cares about.
///
/// Bit 1 is architecturally fixed to one; arithmetic flags are left out and
/// read back as zero.
#[bitfield(u64, order = Lsb)]
pub struct Rflags {
    /// Carry Flag
    pub carry: bool, // 0

    /// Always 1 in 64-bit mode.
    #[bits(default = true)]
    _always1: bool, // 1

    #[bits(7)]
    __: u8, // 2–8

    /// Interrupt Enable Flag
    pub interrupt_enable: bool, // 9

    /// Direction Flag
    pub direction: bool, // 10

    __: bool, // 11

    /// I/O Privilege Level
    #[bits(2)]
    pub iopl: u8, // 12–13

    #[bits(50)]
    __: u64, // 14–63
}

impl Rflags {
    /// Flags for a new context: interrupts enabled, IOPL 0 (`0x202`).
    #[must_use]
    pub const fn initial() -> Self {
        Self::new().with_interrupt_enable(true)
    }
}

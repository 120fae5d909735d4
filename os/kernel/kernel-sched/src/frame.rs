use crate::Privilege;
use kernel_memory_addresses::VirtualAddress;
use kernel_registers::rflags::Rflags;
use kernel_registers::selectors::{KERNEL_CS, KERNEL_SS, USER_CS, USER_SS};

/// Register state as saved on a stack by the interrupt entry stubs.
///
/// The stubs push `rax` first and `r15` last, so `r15` sits at the lowest
/// address. Restoring pops the fifteen general-purpose registers and then
/// `iretq` consumes `rip, cs, rflags, rsp, ss`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct InterruptFrame {
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rbp: u64,
    pub rdi: u64,
    pub rsi: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rbx: u64,
    pub rax: u64,
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

const WORDS: usize = 20;

impl InterruptFrame {
    /// Size in bytes.
    pub const SIZE: usize = WORDS * 8;

    /// The frame a new process starts from: `iretq` lands on `entry` with
    /// an empty stack at `stack_top` and interrupts enabled.
    #[must_use]
    pub fn initial(entry: VirtualAddress, stack_top: VirtualAddress, privilege: Privilege) -> Self {
        let (cs, ss) = selectors(privilege);
        Self {
            rip: entry.as_u64(),
            cs,
            rflags: Rflags::initial().into_bits(),
            rsp: stack_top.as_u64(),
            ss,
            ..Self::default()
        }
    }

    /// Force the selectors of `privilege`, interrupts on and IOPL 0,
    /// whatever the frame held before.
    pub fn confine(&mut self, privilege: Privilege) {
        (self.cs, self.ss) = selectors(privilege);
        self.rflags = Rflags::from_bits(self.rflags)
            .with_interrupt_enable(true)
            .with_iopl(0)
            .into_bits();
    }

    const fn words(&self) -> [u64; WORDS] {
        [
            self.r15, self.r14, self.r13, self.r12, self.r11, self.r10, self.r9, self.r8,
            self.rbp, self.rdi, self.rsi, self.rdx, self.rcx, self.rbx, self.rax, self.rip,
            self.cs, self.rflags, self.rsp, self.ss,
        ]
    }

    /// In-memory layout, lowest address first.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        for (chunk, word) in out.chunks_exact_mut(8).zip(self.words()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let mut w = [0u64; WORDS];
        for (word, chunk) in w.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            *word = u64::from_le_bytes(raw);
        }
        let [r15, r14, r13, r12, r11, r10, r9, r8, rbp, rdi, rsi, rdx, rcx, rbx, rax, rip, cs, rflags, rsp, ss] = w;
        Self {
            r15, r14, r13, r12, r11, r10, r9, r8, rbp, rdi, rsi, rdx, rcx, rbx, rax, rip, cs,
            rflags, rsp, ss,
        }
    }
}

const _: () = assert!(size_of::<InterruptFrame>() == InterruptFrame::SIZE);

/// Code and stack selector of `privilege`.
const fn selectors(privilege: Privilege) -> (u64, u64) {
    match privilege {
        Privilege::Kernel => (KERNEL_CS.as_u64(), KERNEL_SS.as_u64()),
        Privilege::User => (USER_CS.as_u64(), USER_SS.as_u64()),
    }
}

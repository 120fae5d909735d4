//! Naked interrupt entry stubs.
//!
//! Each stub pushes `rax` first and `r15` last, which lays the registers out
//! as an [`InterruptFrame`](kernel_sched::InterruptFrame) below the five
//! words the CPU pushed. The CPU aligns RSP to 16 before its pushes, so the
//! twenty words keep the `call` aligned.

use super::{irq_rust, syscall_rust};
use core::arch::naked_asm;
use kernel_info::limits::IRQ_LINES;

/// Target of the `int 0x80` gate.
#[unsafe(naked)]
pub extern "C" fn syscall_entry() {
    naked_asm!(
        "cld",
        "push rax", "push rbx", "push rcx", "push rdx", "push rsi", "push rdi", "push rbp",
        "push r8", "push r9", "push r10", "push r11", "push r12", "push r13", "push r14", "push r15",
        "mov rdi, rsp",
        "call {rust}",
        "pop r15", "pop r14", "pop r13", "pop r12", "pop r11", "pop r10", "pop r9", "pop r8",
        "pop rbp", "pop rdi", "pop rsi", "pop rdx", "pop rcx", "pop rbx", "pop rax",
        "iretq",
        rust = sym syscall_rust,
    );
}

macro_rules! irq_entries {
    ($($name:ident = $irq:literal),* $(,)?) => {
        $(
            #[unsafe(naked)]
            extern "C" fn $name() {
                naked_asm!(
                    "cld",
                    "push rax", "push rbx", "push rcx", "push rdx", "push rsi", "push rdi", "push rbp",
                    "push r8", "push r9", "push r10", "push r11", "push r12", "push r13", "push r14", "push r15",
                    "mov rdi, rsp",
                    "mov esi, {irq}",
                    "call {rust}",
                    "pop r15", "pop r14", "pop r13", "pop r12", "pop r11", "pop r10", "pop r9", "pop r8",
                    "pop rbp", "pop rdi", "pop rsi", "pop rdx", "pop rcx", "pop rbx", "pop rax",
                    "iretq",
                    irq = const $irq,
                    rust = sym irq_rust,
                );
            }
        )*

        /// IRQ entry stubs, indexed by line.
        pub static IRQ_ENTRIES: [extern "C" fn(); IRQ_LINES] = [$($name),*];
    };
}

irq_entries! {
    irq_entry_0 = 0, irq_entry_1 = 1, irq_entry_2 = 2, irq_entry_3 = 3,
    irq_entry_4 = 4, irq_entry_5 = 5, irq_entry_6 = 6, irq_entry_7 = 7,
    irq_entry_8 = 8, irq_entry_9 = 9, irq_entry_10 = 10, irq_entry_11 = 11,
    irq_entry_12 = 12, irq_entry_13 = 13, irq_entry_14 = 14, irq_entry_15 = 15,
}

//! # Bare-metal glue (x86-64)
//!
//! Owns the one [`Kernel`] instance and connects it to the CPU.
//!
//! ## Collaborator contract
//!
//! The boot code, GDT/TSS and IDT setup are not part of this crate. They must:
//!
//! - load a GDT with the selectors of [`kernel_registers::selectors`];
//! - point vector [`SYSCALL_VECTOR`] (DPL 3) at [`syscall_entry`] and vectors
//!   `IRQ_VECTOR_BASE..` at [`IRQ_ENTRIES`], all as interrupt gates using an
//!   IST stack inside the kernel window, so the live frame never sits on a
//!   process stack;
//! - remap the legacy PIC to [`IRQ_VECTOR_BASE`] and program the timer for
//!   [`TIMER_PERIOD_MS`];
//! - call [`init`], [`spawn`] the first processes, then enter [`idle`].
//!
//! ## Context switch
//!
//! Every entry stub saves the interrupted registers as an
//! [`InterruptFrame`] on the interrupt stack and restores from that same
//! frame on the way out. Switching processes means swapping the frame's
//! contents: the outgoing frame is stored in the process's stack slot, CR3
//! is reloaded, and the incoming slot is copied in. The idle process has no
//! slot; its frame is kept here.

mod cpu;
mod entry;

pub use entry::{IRQ_ENTRIES, syscall_entry};

use crate::{Kernel, KernelError, Outcome, SyscallArgs, TickClock};
use cpu::HwCpu;
use kernel_alloc::frame_alloc::BitmapFrameAlloc;
use kernel_alloc::phys_mapper::HhdmPhysMapper;
use kernel_info::limits::{IRQ_VECTOR_BASE, SYSCALL_VECTOR, TIMER_PERIOD_MS};
use kernel_memory_addresses::{PhysicalFrame, VirtualAddress};
use kernel_sched::{InterruptFrame, Privilege, ProcessId};
use kernel_sync::SpinLock;
use log::error;
use stdlib::syscall_abi::{ERR_INVALID, OK};

/// Length of the `int 0x80` instruction.
const INT80_LEN: u64 = 2;

struct Machine {
    kernel: Kernel<HhdmPhysMapper, &'static TickClock>,
    idle_frame: InterruptFrame,
}

static MACHINE: SpinLock<Option<Machine>> = SpinLock::new(None);
static CLOCK: TickClock = TickClock::new(TIMER_PERIOD_MS);

#[cfg(feature = "qemu")]
static LOGGER: kernel_qemu::QemuLogger = kernel_qemu::QemuLogger::new(log::LevelFilter::Debug);

/// Bring the kernel core up on the page tables rooted at `root`, managing
/// `frames` physical frames from `first` on.
///
/// # Safety
/// The higher-half direct map must cover `root` and every managed frame,
/// none of which may be in use by anything else. `root` must be the active
/// CR3 root and map the kernel. Call once, with interrupts disabled.
pub unsafe fn init(root: PhysicalFrame, first: PhysicalFrame, frames: usize) {
    #[cfg(feature = "qemu")]
    if LOGGER.install().is_err() {
        kernel_qemu::qemu_trace!("kernel: a logger was already installed\n");
    }

    // SAFETY: the direct map covers all frames handed to the core, per contract.
    let mapper = unsafe { HhdmPhysMapper::new() };
    let kernel = Kernel::adopt(mapper, BitmapFrameAlloc::with_range(first, frames), &CLOCK, root);
    *MACHINE.lock_irq() = Some(Machine {
        kernel,
        idle_frame: InterruptFrame::default(),
    });
}

/// Create a process; it first runs when the current one yields.
///
/// # Errors
/// [`KernelError::Uninitialized`] before [`init`], otherwise see
/// [`Kernel::spawn`].
pub fn spawn(entry: VirtualAddress, privilege: Privilege) -> Result<ProcessId, KernelError> {
    let mut guard = MACHINE.lock_irq();
    let machine = guard.as_mut().ok_or(KernelError::Uninitialized)?;
    machine.kernel.spawn(entry, privilege)
}

/// The idle process: sleep until the next interrupt, forever.
pub fn idle() -> ! {
    loop {
        // SAFETY: enabling interrupts and halting has no memory effects.
        unsafe { core::arch::asm!("sti", "hlt", options(nomem, nostack)) };
    }
}

impl Machine {
    /// Reschedule and load whatever runs next into `live`.
    fn switch(&mut self, live: &mut InterruptFrame) {
        let mut cpu = HwCpu::new(live, &mut self.idle_frame);
        match self.kernel.reschedule(&mut cpu) {
            Ok(next) => {
                if let Some(result) = self.kernel.take_wake_result(next) {
                    cpu.live().rax = result.cast_unsigned();
                }
            }
            Err(e) => halt(&e),
        }
    }
}

/// Stop the CPU after an unrecoverable scheduler error.
fn halt(e: &KernelError) -> ! {
    error!("kernel core halted: {e}");
    loop {
        // SAFETY: masking interrupts and halting has no memory effects.
        unsafe { core::arch::asm!("cli", "hlt", options(nomem, nostack)) };
    }
}

extern "C" fn syscall_rust(frame: &mut InterruptFrame) {
    let mut guard = MACHINE.lock_irq();
    let Some(machine) = guard.as_mut() else {
        frame.rax = ERR_INVALID.cast_unsigned();
        return;
    };

    let args = SyscallArgs {
        sysno: frame.rax,
        arg0: frame.rdi,
        arg1: frame.rsi,
        arg2: frame.rdx,
    };
    match machine.kernel.dispatch(args) {
        Outcome::Complete(value) => {
            frame.rax = value.cast_unsigned();
            return;
        }
        Outcome::Yield => frame.rax = OK.cast_unsigned(),
        // rax still holds the call number; resume on the `int 0x80` itself.
        Outcome::Blocked { restart: true } => frame.rip -= INT80_LEN,
        Outcome::Blocked { restart: false } | Outcome::Exited => {}
    }
    machine.switch(frame);
}

extern "C" fn irq_rust(frame: &mut InterruptFrame, irq: u64) {
    pic_eoi(irq);
    let mut guard = MACHINE.lock_irq();
    let Some(machine) = guard.as_mut() else {
        return;
    };
    let Ok(irq) = u8::try_from(irq) else {
        return;
    };

    machine.kernel.interrupt(irq);
    if machine.kernel.current().is_idle() {
        machine.switch(frame);
    }
}

/// Acknowledge `irq` at the legacy PIC pair.
fn pic_eoi(irq: u64) {
    const EOI: u8 = 0x20;
    // SAFETY: writes to the PIC command ports only.
    unsafe {
        if irq >= 8 {
            core::arch::asm!("out 0xA0, al", in("al") EOI, options(nomem, nostack, preserves_flags));
        }
        core::arch::asm!("out 0x20, al", in("al") EOI, options(nomem, nostack, preserves_flags));
    }
}

// INT80_LEN assumes the two-byte `int imm8` encoding.
const _: () = assert!(SYSCALL_VECTOR == 0x80 && IRQ_VECTOR_BASE >= 32);

//! # Kernel Core
//!
//! Ties the frame allocator, address spaces, scheduler, IPC queue and IRQ
//! waits together behind one owner, [`Kernel`], and implements the syscall
//! dispatcher on top of it.
//!
//! ```text
//!  int 0x80 ──► Kernel::dispatch ──► Outcome ──┐
//!                                              ├──► Kernel::reschedule ──► Cpu
//!  IRQ n ─────► Kernel::interrupt ─► wake-ups ─┘
//! ```
//!
//! Hardware stays behind seams so the whole core runs in hosted tests:
//!
//! - [`PhysMapper`](kernel_vmem::PhysMapper): physical memory access
//!   (HHDM on hardware, [`FrameArena`](kernel_vmem::FrameArena) in tests).
//! - [`Cpu`](kernel_sched::Cpu): CR3 loads and context switches.
//! - [`Clock`]: milliseconds for IRQ wait timeouts.
//!
//! The bare-metal glue in `arch` (x86-64, `target_os = "none"` only) holds
//! the kernel in an interrupt-disabling spin lock and provides the entry
//! stubs the interrupt descriptor table points at.
//!
//! ## Scheduling model
//!
//! Cooperative and single-CPU. A process leaves the CPU only inside a
//! syscall: yield, a blocking receive, an IRQ wait, or exit. Interrupts
//! only flip process states; the idle process yields on every interrupt.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[allow(unsafe_code)]
pub mod arch;
mod clock;
mod error;
pub mod irq_wait;
mod kernel;
pub mod syscall;

pub use crate::clock::{Clock, ManualClock, TickClock};
pub use crate::error::{KernelError, SyscallError};
pub use crate::kernel::Kernel;
pub use crate::syscall::{Outcome, SyscallArgs};

//! # Scheduler
//!
//! Process records, the round-robin ready queue and the context-switch
//! sequence of a single-CPU, cooperatively scheduled kernel.
//!
//! ## Process states
//!
//! ```text
//!            create
//!              │
//!              ▼        schedule()
//!          ┌───────┐ ─────────────► ┌─────────┐
//!          │ Ready │                │ Running │
//!          └───────┘ ◄───────────── └─────────┘
//!            ▲   │     schedule()       │
//!     wake() │   │ block()              │ block()
//!            │   ▼                      ▼
//!          ┌─────────┐ ◄────────────────┘
//!          │ Blocked │
//!          └─────────┘
//!
//!   any state ── terminate() ──► Terminated ── reap() ──► gone
//! ```
//!
//! Process `0` is the idle process. It owns the kernel address space, never
//! enters the ready queue, and runs only when nothing else is ready.
//!
//! ## Hardware seams
//!
//! - [`Cpu`] loads a page-table root and switches register contexts. The
//!   bare-metal kernel implements it with CR3 and a [`FrameSwitch`] over
//!   the stack slots; tests record the calls.
//! - [`Waker`] lets interrupt-path code move blocked processes back to
//!   `Ready` without knowing about the queue.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

mod error;
mod frame;
mod process;
mod scheduler;
mod switch;

pub use crate::error::{FatalError, SchedError};
pub use crate::frame::InterruptFrame;
pub use crate::process::{BlockReason, Context, Privilege, Process, ProcessId, ProcessState};
pub use crate::scheduler::Scheduler;
pub use crate::switch::{FrameStore, FrameSwitch};
use kernel_memory_addresses::PhysicalFrame;

/// The two privileged operations a context switch needs.
pub trait Cpu {
    /// Make the table rooted at `root` the active translation.
    fn activate(&mut self, root: PhysicalFrame);

    /// Save the running register state into `prev` and resume `next`.
    ///
    /// On hardware this returns only when `prev` is scheduled again.
    fn switch_context(&mut self, prev: &mut Context, next: &Context);
}

/// Moves a blocked process back to `Ready`.
///
/// Called from interrupt context: implementations only flip state, they
/// never switch.
pub trait Waker {
    /// Wake `pid` with the syscall result it should observe. Returns `false`
    /// if `pid` was not blocked.
    fn wake(&mut self, pid: ProcessId, result: i64) -> bool;
}

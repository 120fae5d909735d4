//! # Kernel synchronization primitives
//!
//! The kernel core is single-CPU. Its shared state lives behind one
//! [`SpinLock`], and code that can race with interrupt handlers takes it via
//! [`SpinLock::lock_irq`] so the handler cannot re-enter the critical section.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod irq;
mod spin_lock;

pub use irq::{IrqGuard, IrqSpinLockGuard};
pub use spin_lock::{SpinLock, SpinLockGuard};

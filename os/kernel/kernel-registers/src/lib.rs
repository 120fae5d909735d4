//! # Typed `x86_64` Registers
//!
//! Bitfield models of the few architectural values the kernel core writes:
//!
//! - [`cr3::Cr3`]: root of the active translation hierarchy.
//! - [`rflags::Rflags`]: the flags word pushed into an initial interrupt frame.
//! - [`selectors::SegmentSelector`]: CS/SS values for kernel and user frames.
//!
//! Actual register access is only compiled with the `asm` feature on `x86_64`.
//! Everything else is plain data and can be used in host tests.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod cr3;
pub mod rflags;
pub mod selectors;

pub trait LoadRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// For example, the register access might be privileged and require kernel mode (Ring 0).
    unsafe fn load_unsafe() -> Self;
}

pub trait StoreRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// For example, the register access might be privileged and require kernel mode (Ring 0).
    unsafe fn store_unsafe(self);
}

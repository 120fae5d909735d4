//! # User/kernel shared definitions
//!
//! - `syscall_abi`: syscall numbers, return codes, flag bits and the IPC
//!   message layout. Shared verbatim by both sides of the trap.
//! - `syscall`: `int 0x80` wrappers for user programs.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![cfg_attr(not(feature = "syscall"), forbid(unsafe_code))]
#![cfg_attr(feature = "syscall", allow(unsafe_code))]

#[cfg(all(feature = "syscall", target_arch = "x86_64"))]
pub mod syscall;

#[cfg(feature = "syscall-abi")]
pub mod syscall_abi;

#[cfg(all(feature = "userland", target_os = "none"))]
mod panic {
    #[panic_handler]
    fn panic(_: &core::panic::PanicInfo) -> ! {
        crate::syscall::exit()
    }
}

//! User-side syscall wrappers (`int 0x80`).
//!
//! Arguments go in `rdi`, `rsi`, `rdx`; the call number in `rax`, which
//! also carries the result back.

use crate::syscall_abi::{IpcMessage, IrqWaitFlags, ReceiveFlags, Sysno};

#[inline(always)]
#[allow(clippy::inline_always)]
fn syscall3(n: Sysno, a0: u64, a1: u64, a2: u64) -> i64 {
    let ret: i64;
    unsafe {
        core::arch::asm!(
            "int 0x80",
            inlateout("rax") n as u64 => ret,
            in("rdi") a0,
            in("rsi") a1,
            in("rdx") a2,
            options(nostack)
        );
    }
    ret
}

/// Queue `msg` for `target`. `0` on success, `-1` if the queue is full.
pub fn ipc_send(target: u32, msg: &IpcMessage) -> i64 {
    syscall3(Sysno::IpcSend, u64::from(target), core::ptr::from_ref(msg) as u64, 0)
}

/// Take the oldest message. Without [`ReceiveFlags::BLOCK`], `-1` if none is queued.
pub fn ipc_receive(msg: &mut IpcMessage, flags: ReceiveFlags) -> i64 {
    syscall3(Sysno::IpcReceive, core::ptr::from_mut(msg) as u64, flags.bits(), 0)
}

pub fn yield_now() {
    syscall3(Sysno::Yield, 0, 0, 0);
}

/// Map the page at `virt` to `phys` with the [`page`](crate::syscall_abi::page) bits in `flags`.
pub fn map_page(virt: u64, phys: u64, flags: u64) -> i64 {
    syscall3(Sysno::MapPage, virt, phys, flags)
}

/// Wait for `irq`. A `timeout_ms` of zero waits forever.
pub fn irq_wait(irq: u8, flags: IrqWaitFlags, timeout_ms: u64) -> i64 {
    syscall3(Sysno::IrqWait, u64::from(irq), flags.bits(), timeout_ms)
}

pub fn irq_count(irq: u8) -> i64 {
    syscall3(Sysno::IrqGetCount, u64::from(irq), 0, 0)
}

/// Reset the counter of `irq`, returning its previous value.
pub fn irq_reset_count(irq: u8) -> i64 {
    syscall3(Sysno::IrqResetCount, u64::from(irq), 0, 0)
}

pub fn exit() -> ! {
    syscall3(Sysno::Exit, 0, 0, 0);
    loop {
        core::hint::spin_loop();
    }
}

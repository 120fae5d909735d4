//! # QEMU Debug Output
//!
//! Log sink for kernels running under QEMU. Bytes written to I/O port
//! `0x402` show up on the host when QEMU runs with `-debugcon`:
//!
//! ```bash
//! qemu-system-x86_64 ... -debugcon stdio
//! ```
//!
//! ## Output path
//! ```text
//! log::debug!(..) ──► QemuLogger ──┐
//!                                  ├──► QemuSink (fmt::Write) ──► out 0x402
//! qemu_trace!(..) ─────────────────┘
//! ```
//!
//! [`qemu_trace!`] bypasses the `log` facade and is usable before the
//! logger is installed.
//!
//! ## Features
//!
//! - `enabled` (default): port writes are compiled in on the bare-metal
//!   target. Without it, or on a hosted target, all output is dropped.
//!
//! ## Usage
//! ```rust,no_run
//! use kernel_qemu::QemuLogger;
//! use log::LevelFilter;
//!
//! static LOGGER: QemuLogger = QemuLogger::new(LevelFilter::Debug);
//! LOGGER.install().ok();
//! log::info!("scheduler up");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

pub use logger::QemuLogger;

#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};

    /// QEMU's debug console port.
    pub const QEMU_DEBUG_PORT: u16 = 0x402;

    /// Write one byte to the debug port.
    #[inline]
    pub fn dbg_putc(c: u8) {
        #[cfg(all(feature = "enabled", target_arch = "x86_64", target_os = "none"))]
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") QEMU_DEBUG_PORT,
                in("al") c,
                options(nomem, nostack, preserves_flags)
            );
        }
        #[cfg(not(all(feature = "enabled", target_arch = "x86_64", target_os = "none")))]
        let _ = c;
    }

    /// `fmt::Write` over the debug port. Never fails.
    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            s.bytes().for_each(dbg_putc);
            Ok(())
        }
    }

    #[inline]
    pub fn qemu_write(args: fmt::Arguments) {
        // Best-effort debug output.
        let _ = fmt::write(&mut QemuSink, args);
    }
}

/// `print!`-style output straight to the debug port.
#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}

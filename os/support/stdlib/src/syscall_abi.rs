//! Syscall ABI.
//!
//! | `rax` | call | `rdi` | `rsi` | `rdx` | result |
//! |-------|------|-------|-------|-------|--------|
//! | 1 | [`Sysno::IpcSend`] | target pid | `*const IpcMessage` | | `0` / `-1` |
//! | 2 | [`Sysno::IpcReceive`] | `*mut IpcMessage` | [`ReceiveFlags`] | | `0` / `-1` |
//! | 3 | [`Sysno::Yield`] | | | | `0` |
//! | 4 | [`Sysno::MapPage`] | virtual | physical | [`page`] flags | `0` / `-1` |
//! | 5 | [`Sysno::IrqWait`] | irq | [`IrqWaitFlags`] | timeout ms | `0`, `-1`..`-4` |
//! | 6 | [`Sysno::IrqGetCount`] | irq | | | count / `-1` |
//! | 7 | [`Sysno::IrqResetCount`] | irq | | | previous count / `-1` |
//! | 8 | [`Sysno::Exit`] | | | | does not return |

use kernel_info::limits::IPC_PAYLOAD_SIZE;

#[repr(u64)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Sysno {
    /// Queue a message for another process.
    IpcSend = 1,
    /// Take the oldest queued message.
    IpcReceive = 2,
    /// Give up the CPU.
    Yield = 3,
    /// Map one page into the caller's address space.
    MapPage = 4,
    /// Block until an interrupt line fires.
    IrqWait = 5,
    /// Read an interrupt line's occurrence counter.
    IrqGetCount = 6,
    /// Reset an interrupt line's occurrence counter.
    IrqResetCount = 7,
    /// Terminate the caller.
    Exit = 8,
}

impl TryFrom<u64> for Sysno {
    type Error = u64;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::IpcSend,
            2 => Self::IpcReceive,
            3 => Self::Yield,
            4 => Self::MapPage,
            5 => Self::IrqWait,
            6 => Self::IrqGetCount,
            7 => Self::IrqResetCount,
            8 => Self::Exit,
            other => return Err(other),
        })
    }
}

/// Success.
pub const OK: i64 = 0;
/// Invalid argument, unknown call, invalid IRQ, full or empty queue.
pub const ERR_INVALID: i64 = -1;
/// A non-blocking request could not complete.
pub const ERR_WOULD_BLOCK: i64 = -2;
/// A blocking wait ran out of time.
pub const ERR_TIMEOUT: i64 = -3;
/// The calling process cannot wait (unknown, idle, or already waiting).
pub const ERR_INVALID_PROCESS: i64 = -4;

bitflags::bitflags! {
    /// Flags of [`Sysno::IrqWait`].
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct IrqWaitFlags: u64 {
        /// Reset the occurrence latch when the wait completes.
        const CLEAR   = 1 << 0;
        /// Fail with [`ERR_WOULD_BLOCK`] instead of blocking.
        const NO_WAIT = 1 << 1;
    }
}

bitflags::bitflags! {
    /// Flags of [`Sysno::IpcReceive`].
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct ReceiveFlags: u64 {
        /// Block while the queue is empty instead of failing.
        const BLOCK = 1 << 0;
    }
}

/// Page permission bits of [`Sysno::MapPage`], equal to the hardware bits.
pub mod page {
    pub const PRESENT: u64 = 1 << 0;
    pub const WRITABLE: u64 = 1 << 1;
    pub const USER: u64 = 1 << 2;
}

/// A fixed-size message, copied by value.
///
/// Wire layout (`repr(C)`, little endian): `sender: u32`, `len: u32`,
/// `payload: [u8; 256]`.
#[repr(C)]
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct IpcMessage {
    /// Filled in by the kernel on send.
    pub sender: u32,
    /// Number of meaningful payload bytes.
    pub len: u32,
    pub payload: [u8; IPC_PAYLOAD_SIZE],
}

impl Default for IpcMessage {
    fn default() -> Self {
        Self {
            sender: 0,
            len: 0,
            payload: [0; IPC_PAYLOAD_SIZE],
        }
    }
}

impl IpcMessage {
    /// Size of the wire layout in bytes.
    pub const SIZE: usize = 8 + IPC_PAYLOAD_SIZE;

    /// A message carrying `data`, or `None` if it does not fit.
    #[must_use]
    pub fn new(data: &[u8]) -> Option<Self> {
        let len = u32::try_from(data.len()).ok()?;
        if data.len() > IPC_PAYLOAD_SIZE {
            return None;
        }
        let mut msg = Self {
            len,
            ..Self::default()
        };
        msg.payload[..data.len()].copy_from_slice(data);
        Some(msg)
    }

    /// The meaningful payload bytes; clamped if `len` is out of range.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        let len = (self.len as usize).min(IPC_PAYLOAD_SIZE);
        &self.payload[..len]
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.sender.to_le_bytes());
        out[4..8].copy_from_slice(&self.len.to_le_bytes());
        out[8..].copy_from_slice(&self.payload);
        out
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let mut msg = Self {
            sender: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            len: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            ..Self::default()
        };
        msg.payload.copy_from_slice(&bytes[8..]);
        msg
    }
}

impl core::fmt::Debug for IpcMessage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IpcMessage")
            .field("sender", &self.sender)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

const _: () = assert!(size_of::<IpcMessage>() == IpcMessage::SIZE);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sysno_numbers_are_stable() {
        for n in 1..=8 {
            assert_eq!(Sysno::try_from(n).map(|s| s as u64), Ok(n));
        }
        assert_eq!(Sysno::try_from(0), Err(0));
        assert_eq!(Sysno::try_from(9), Err(9));
    }

    #[test]
    fn message_wire_layout() {
        let mut msg = IpcMessage::new(b"hi").unwrap();
        msg.sender = 7;
        let bytes = msg.to_bytes();
        assert_eq!(&bytes[..10], &[7, 0, 0, 0, 2, 0, 0, 0, b'h', b'i']);
        assert_eq!(IpcMessage::from_bytes(&bytes), msg);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        assert!(IpcMessage::new(&[0; IPC_PAYLOAD_SIZE]).is_some());
        assert!(IpcMessage::new(&[0; IPC_PAYLOAD_SIZE + 1]).is_none());
    }

    #[test]
    fn data_is_clamped() {
        let msg = IpcMessage {
            len: 10_000,
            ..IpcMessage::default()
        };
        assert_eq!(msg.data().len(), IPC_PAYLOAD_SIZE);
    }
}

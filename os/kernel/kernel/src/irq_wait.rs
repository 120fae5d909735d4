//! # Interrupt waits
//!
//! Per-line occurrence state plus a fixed table of blocked waiters.
//!
//! ```text
//!  IRQ n fires ──► notify(n) ──► count += 1, latch = set
//!                      │
//!                      └──► every waiter on n: removed, woken with 0
//!                           (latch cleared if any of them asked for CLEAR)
//!
//!  timer tick ───► expire(now) ──► waiters past their deadline:
//!                                  removed, woken with ERR_TIMEOUT
//! ```
//!
//! Nothing here switches or blocks; [`notify`](IrqWait::notify) and
//! [`expire`](IrqWait::expire) only hand wake-ups to a [`Waker`] and are safe
//! to call from interrupt context.

use crate::SyscallError;
use kernel_info::limits::{IRQ_LINES, MAX_IRQ_WAITERS};
use kernel_sched::{ProcessId, Waker};
use log::{debug, trace};
use stdlib::syscall_abi::{ERR_TIMEOUT, IrqWaitFlags, OK};

/// A process blocked until `irq` fires or its timeout passes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Waiter {
    pub pid: ProcessId,
    pub irq: u8,
    pub flags: IrqWaitFlags,
    /// `0` waits forever.
    pub timeout_ms: u64,
    pub started_ms: u64,
}

impl Waiter {
    #[must_use]
    pub const fn is_expired(&self, now_ms: u64) -> bool {
        self.timeout_ms != 0 && now_ms.saturating_sub(self.started_ms) >= self.timeout_ms
    }
}

/// What [`IrqWait::wait`] decided.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WaitStatus {
    /// The line had already fired; the wait completes at once.
    Ready,
    /// A waiter was registered; the caller must block.
    Registered,
}

#[derive(Copy, Clone, Debug, Default)]
struct Line {
    occurred: bool,
    count: u32,
}

/// Occurrence latches, counters and the waiter table.
///
/// ### Invariants
/// - At most one waiter per `(pid, irq)` pair.
/// - Counters only change through `notify` (wrapping) and `reset_count`.
#[derive(Debug)]
pub struct IrqWait {
    lines: [Line; IRQ_LINES],
    waiters: [Option<Waiter>; MAX_IRQ_WAITERS],
}

impl Default for IrqWait {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqWait {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: [Line {
                occurred: false,
                count: 0,
            }; IRQ_LINES],
            waiters: [None; MAX_IRQ_WAITERS],
        }
    }

    fn line(&self, irq: u8) -> Result<&Line, SyscallError> {
        self.lines
            .get(usize::from(irq))
            .ok_or(SyscallError::InvalidArgument)
    }

    fn line_mut(&mut self, irq: u8) -> Result<&mut Line, SyscallError> {
        self.lines
            .get_mut(usize::from(irq))
            .ok_or(SyscallError::InvalidArgument)
    }

    /// Start waiting for `irq` on behalf of `pid`.
    ///
    /// A latched occurrence completes the wait immediately and is consumed
    /// if `flags` contains `CLEAR`.
    ///
    /// # Errors
    /// - [`SyscallError::InvalidArgument`] for an IRQ outside `0..IRQ_LINES`.
    /// - [`SyscallError::WouldBlock`] with `NO_WAIT` and no occurrence, or
    ///   if the waiter table is full.
    /// - [`SyscallError::InvalidProcess`] if `pid` already waits on `irq`;
    ///   the existing waiter is left as it was.
    pub fn wait(
        &mut self,
        pid: ProcessId,
        irq: u8,
        flags: IrqWaitFlags,
        timeout_ms: u64,
        now_ms: u64,
    ) -> Result<WaitStatus, SyscallError> {
        let line = self.line_mut(irq)?;
        if line.occurred {
            if flags.contains(IrqWaitFlags::CLEAR) {
                line.occurred = false;
            }
            trace!("irq {irq}: already latched for {pid}");
            return Ok(WaitStatus::Ready);
        }
        if flags.contains(IrqWaitFlags::NO_WAIT) {
            return Err(SyscallError::WouldBlock);
        }
        if self.waiter(pid, irq).is_some() {
            return Err(SyscallError::InvalidProcess);
        }

        let slot = self
            .waiters
            .iter_mut()
            .find(|w| w.is_none())
            .ok_or(SyscallError::WouldBlock)?;
        *slot = Some(Waiter {
            pid,
            irq,
            flags,
            timeout_ms,
            started_ms: now_ms,
        });
        debug!("irq {irq}: {pid} waits (timeout {timeout_ms} ms)");
        Ok(WaitStatus::Registered)
    }

    /// Record an occurrence of `irq` and wake its waiters. Returns how many
    /// were woken; out-of-range lines are ignored.
    pub fn notify<W: Waker + ?Sized>(&mut self, irq: u8, waker: &mut W) -> usize {
        let Ok(line) = self.line_mut(irq) else {
            trace!("irq {irq}: no such line");
            return 0;
        };
        line.count = line.count.wrapping_add(1);
        line.occurred = true;

        let mut woken = 0;
        let mut consume = false;
        for slot in &mut self.waiters {
            let Some(w) = slot.filter(|w| w.irq == irq) else {
                continue;
            };
            *slot = None;
            consume |= w.flags.contains(IrqWaitFlags::CLEAR);
            if waker.wake(w.pid, OK) {
                woken += 1;
            }
        }
        if consume {
            self.lines[usize::from(irq)].occurred = false;
        }
        trace!("irq {irq}: occurrence, woke {woken}");
        woken
    }

    /// Wake every waiter whose timeout has passed at `now_ms` with
    /// `ERR_TIMEOUT`. Returns how many were woken.
    pub fn expire<W: Waker + ?Sized>(&mut self, now_ms: u64, waker: &mut W) -> usize {
        let mut woken = 0;
        for slot in &mut self.waiters {
            let Some(w) = slot.filter(|w| w.is_expired(now_ms)) else {
                continue;
            };
            *slot = None;
            debug!("irq {}: wait of {} timed out", w.irq, w.pid);
            if waker.wake(w.pid, ERR_TIMEOUT) {
                woken += 1;
            }
        }
        woken
    }

    /// Drop every waiter of `pid` without waking it.
    pub fn cancel(&mut self, pid: ProcessId) -> usize {
        let mut removed = 0;
        for slot in &mut self.waiters {
            if slot.is_some_and(|w| w.pid == pid) {
                *slot = None;
                removed += 1;
            }
        }
        removed
    }

    #[must_use]
    pub fn waiter(&self, pid: ProcessId, irq: u8) -> Option<&Waiter> {
        self.waiters
            .iter()
            .flatten()
            .find(|w| w.pid == pid && w.irq == irq)
    }

    /// Number of registered waiters.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.waiters.iter().flatten().count()
    }

    /// Occurrences of `irq` since the last reset.
    ///
    /// # Errors
    /// [`SyscallError::InvalidArgument`] for an IRQ outside `0..IRQ_LINES`.
    pub fn count(&self, irq: u8) -> Result<u32, SyscallError> {
        self.line(irq).map(|l| l.count)
    }

    /// Zero the counter of `irq`, returning its previous value. The latch
    /// is not touched.
    ///
    /// # Errors
    /// [`SyscallError::InvalidArgument`] for an IRQ outside `0..IRQ_LINES`.
    pub fn reset_count(&mut self, irq: u8) -> Result<u32, SyscallError> {
        let line = self.line_mut(irq)?;
        Ok(core::mem::take(&mut line.count))
    }

    /// Whether `irq` has fired without being consumed.
    ///
    /// # Errors
    /// [`SyscallError::InvalidArgument`] for an IRQ outside `0..IRQ_LINES`.
    pub fn occurred(&self, irq: u8) -> Result<bool, SyscallError> {
        self.line(irq).map(|l| l.occurred)
    }
}

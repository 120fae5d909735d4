//! Syscall dispatch.
//!
//! [`Kernel::dispatch`] runs one call on behalf of the current process and
//! says what the entry glue has to do next; see [`Outcome`]. The register
//! convention and return codes are in [`stdlib::syscall_abi`].

use crate::clock::Clock;
use crate::irq_wait::WaitStatus;
use crate::{Kernel, SyscallError};
use kernel_ipc::IpcMessage;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_sched::{BlockReason, ProcessId, Waker};
use kernel_vmem::{AddressSpace, MapFlags, PhysMapper};
use log::{debug, trace};
use stdlib::syscall_abi::{IrqWaitFlags, OK, ReceiveFlags, Sysno};

/// Raw syscall registers: `rax` and the first three arguments.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SyscallArgs {
    pub sysno: u64,
    pub arg0: u64,
    pub arg1: u64,
    pub arg2: u64,
}

impl SyscallArgs {
    #[must_use]
    pub const fn new(sysno: Sysno, arg0: u64, arg1: u64, arg2: u64) -> Self {
        Self {
            sysno: sysno as u64,
            arg0,
            arg1,
            arg2,
        }
    }
}

/// How a dispatched call continues.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Return the value to the caller and keep running it.
    Complete(i64),
    /// Return `0` to the caller, then reschedule.
    Yield,
    /// The caller is blocked; reschedule. Once it runs again, the call is
    /// issued again if `restart`, otherwise it returns the wake result.
    Blocked { restart: bool },
    /// The caller is gone; reschedule.
    Exited,
}

impl Outcome {
    #[must_use]
    pub const fn reschedules(self) -> bool {
        !matches!(self, Self::Complete(_))
    }
}

impl<M: PhysMapper, C: Clock> Kernel<M, C> {
    /// Execute a syscall for the current process.
    pub fn dispatch(&mut self, args: SyscallArgs) -> Outcome {
        let caller = self.sched.current();
        let result = match Sysno::try_from(args.sysno) {
            Ok(sysno) => {
                trace!("{caller}: {sysno:?}({:#x}, {:#x}, {:#x})", args.arg0, args.arg1, args.arg2);
                self.dispatch_call(caller, sysno, args)
            }
            Err(unknown) => {
                debug!("{caller}: unknown syscall {unknown}");
                Err(SyscallError::InvalidArgument)
            }
        };
        result.unwrap_or_else(|e| {
            trace!("{caller}: failed: {e}");
            Outcome::Complete(e.code())
        })
    }

    fn dispatch_call(
        &mut self,
        caller: ProcessId,
        sysno: Sysno,
        args: SyscallArgs,
    ) -> Result<Outcome, SyscallError> {
        match sysno {
            Sysno::IpcSend => self.sys_ipc_send(caller, args.arg0, args.arg1),
            Sysno::IpcReceive => self.sys_ipc_receive(caller, args.arg0, args.arg1),
            Sysno::Yield => Ok(Outcome::Yield),
            Sysno::MapPage => self.sys_map_page(caller, args.arg0, args.arg1, args.arg2),
            Sysno::IrqWait => self.sys_irq_wait(caller, args.arg0, args.arg1, args.arg2),
            Sysno::IrqGetCount => {
                let count = self.irq.count(irq_number(args.arg0)?)?;
                Ok(Outcome::Complete(i64::from(count)))
            }
            Sysno::IrqResetCount => {
                let previous = self.irq.reset_count(irq_number(args.arg0)?)?;
                Ok(Outcome::Complete(i64::from(previous)))
            }
            Sysno::Exit => {
                self.exit(caller).map_err(|_| SyscallError::InvalidProcess)?;
                Ok(Outcome::Exited)
            }
        }
    }

    /// Queue the message at `msg_ptr`, stamped with the caller's id, and
    /// wake the longest-waiting blocked receiver.
    fn sys_ipc_send(&mut self, caller: ProcessId, target: u64, msg_ptr: u64) -> Result<Outcome, SyscallError> {
        let target = u32::try_from(target).map_err(|_| SyscallError::InvalidArgument)?;
        let mut raw = [0u8; IpcMessage::SIZE];
        let (space, access) = self.space_of(caller)?;
        space.read_with(&self.mapper, VirtualAddress::new(msg_ptr), &mut raw, access)?;

        let mut msg = IpcMessage::from_bytes(&raw);
        msg.sender = caller.as_u32();
        self.ipc.send(target, &msg)?;

        if let Some(receiver) = self.sched.longest_blocked(BlockReason::IpcReceive) {
            self.sched.wake(receiver, OK);
            // The receive restarts and fetches the message itself.
            self.sched.take_wake_result(receiver);
        }
        Ok(Outcome::Complete(OK))
    }

    /// Move the oldest message to `buf_ptr`. With [`ReceiveFlags::BLOCK`] an
    /// empty queue blocks the caller until the next send.
    fn sys_ipc_receive(&mut self, caller: ProcessId, buf_ptr: u64, flags: u64) -> Result<Outcome, SyscallError> {
        let flags = ReceiveFlags::from_bits(flags).ok_or(SyscallError::InvalidArgument)?;
        let Some(msg) = self.ipc.peek().copied() else {
            if flags.contains(ReceiveFlags::BLOCK) && !caller.is_idle() {
                self.sched
                    .block(caller, BlockReason::IpcReceive)
                    .map_err(|_| SyscallError::InvalidProcess)?;
                return Ok(Outcome::Blocked { restart: true });
            }
            return Err(SyscallError::Empty);
        };

        // Copy first so a bad buffer leaves the message queued.
        let process = self.sched.process(caller).ok_or(SyscallError::InvalidProcess)?;
        process.space().write_with(
            &mut self.mapper,
            VirtualAddress::new(buf_ptr),
            &msg.to_bytes(),
            process.privilege().access(),
        )?;
        self.ipc.receive()?;
        Ok(Outcome::Complete(OK))
    }

    fn sys_map_page(&mut self, caller: ProcessId, va: u64, pa: u64, flags: u64) -> Result<Outcome, SyscallError> {
        let flags = MapFlags::from_bits(flags).ok_or(SyscallError::InvalidArgument)?;
        let space = self
            .sched
            .process(caller)
            .ok_or(SyscallError::InvalidProcess)?
            .space();
        space.map(
            &mut self.mapper,
            &mut self.frames,
            VirtualAddress::new(va),
            PhysicalAddress::new(pa),
            flags,
        )?;
        debug!("{caller}: mapped {va:#x} -> {pa:#x} ({flags:?})");
        Ok(Outcome::Complete(OK))
    }

    fn sys_irq_wait(&mut self, caller: ProcessId, irq: u64, flags: u64, timeout_ms: u64) -> Result<Outcome, SyscallError> {
        let irq = irq_number(irq)?;
        let flags = IrqWaitFlags::from_bits(flags).ok_or(SyscallError::InvalidArgument)?;
        if caller.is_idle() {
            // The idle process may poll but never block.
            return match self.irq.wait(caller, irq, flags | IrqWaitFlags::NO_WAIT, 0, 0) {
                Ok(_) => Ok(Outcome::Complete(OK)),
                Err(SyscallError::WouldBlock) if !flags.contains(IrqWaitFlags::NO_WAIT) => {
                    Err(SyscallError::InvalidProcess)
                }
                Err(e) => Err(e),
            };
        }

        let now = self.clock.now_ms();
        match self.irq.wait(caller, irq, flags, timeout_ms, now)? {
            WaitStatus::Ready => Ok(Outcome::Complete(OK)),
            WaitStatus::Registered => {
                if self.sched.block(caller, BlockReason::Irq(irq)).is_err() {
                    self.irq.cancel(caller);
                    return Err(SyscallError::InvalidProcess);
                }
                Ok(Outcome::Blocked { restart: false })
            }
        }
    }

    /// The caller's space and the access its buffers must carry.
    fn space_of(&self, pid: ProcessId) -> Result<(&AddressSpace, MapFlags), SyscallError> {
        self.sched
            .process(pid)
            .map(|p| (p.space(), p.privilege().access()))
            .ok_or(SyscallError::InvalidProcess)
    }
}

fn irq_number(raw: u64) -> Result<u8, SyscallError> {
    u8::try_from(raw).map_err(|_| SyscallError::InvalidArgument)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_complete_keeps_the_caller_running() {
        assert!(!Outcome::Complete(0).reschedules());
        assert!(Outcome::Yield.reschedules());
        assert!(Outcome::Blocked { restart: true }.reschedules());
        assert!(Outcome::Exited.reschedules());
    }

    #[test]
    fn irq_numbers_must_fit_a_byte() {
        assert_eq!(irq_number(3), Ok(3));
        assert_eq!(irq_number(256), Err(SyscallError::InvalidArgument));
    }
}

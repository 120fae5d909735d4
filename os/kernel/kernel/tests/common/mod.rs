#![allow(dead_code)]

use kernel::{Kernel, ManualClock, Outcome, SyscallArgs};
use kernel_alloc::frame_alloc::BitmapFrameAlloc;
use kernel_info::memory::USER_STACK_BASE;
use kernel_memory_addresses::{PhysicalFrame, VirtualAddress};
use kernel_sched::{Context, Cpu, Privilege, ProcessId};
use kernel_vmem::FrameArena;
use stdlib::syscall_abi::{IpcMessage, Sysno};

pub type TestKernel = Kernel<FrameArena, ManualClock>;

/// Scratch buffer inside every process's stack page.
pub const BUF: u64 = USER_STACK_BASE;

#[derive(Default)]
pub struct RecordingCpu {
    pub activations: Vec<PhysicalFrame>,
    pub switches: usize,
}

impl Cpu for RecordingCpu {
    fn activate(&mut self, root: PhysicalFrame) {
        self.activations.push(root);
    }

    fn switch_context(&mut self, _prev: &mut Context, _next: &Context) {
        self.switches += 1;
    }
}

pub fn kernel() -> TestKernel {
    Kernel::new(FrameArena::new(), BitmapFrameAlloc::new(), ManualClock::new()).unwrap()
}

pub fn spawn(k: &mut TestKernel) -> ProcessId {
    k.spawn(VirtualAddress::new(0x40_0000), Privilege::User).unwrap()
}

/// Reschedule until `pid` is running.
pub fn run(k: &mut TestKernel, cpu: &mut RecordingCpu, pid: ProcessId) {
    for _ in 0..64 {
        if k.current() == pid {
            return;
        }
        k.reschedule(cpu).unwrap();
    }
    panic!("{pid:?} never got the CPU");
}

pub fn call(k: &mut TestKernel, sysno: Sysno, a0: u64, a1: u64, a2: u64) -> Outcome {
    k.dispatch(SyscallArgs::new(sysno, a0, a1, a2))
}

/// Send `data` from the current process to `target`.
pub fn send(k: &mut TestKernel, target: ProcessId, data: &[u8]) -> Outcome {
    let me = k.current();
    let msg = IpcMessage::new(data).unwrap();
    k.copy_to_user(me, VirtualAddress::new(BUF), &msg.to_bytes()).unwrap();
    call(k, Sysno::IpcSend, u64::from(target.as_u32()), BUF, 0)
}

/// The message the current process last received into [`BUF`].
pub fn received(k: &TestKernel) -> IpcMessage {
    let mut raw = [0u8; IpcMessage::SIZE];
    k.copy_from_user(k.current(), VirtualAddress::new(BUF), &mut raw).unwrap();
    IpcMessage::from_bytes(&raw)
}

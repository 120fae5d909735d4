mod common;

use common::{RecordingCpu, call, kernel, run, spawn};
use kernel::{Outcome, SyscallArgs};
use kernel_info::memory::KERNEL_BASE;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_sched::ProcessState;
use kernel_vmem::MapFlags;
use stdlib::syscall_abi::{ERR_INVALID, ERR_INVALID_PROCESS, OK, Sysno, page};

const RW_USER: u64 = page::PRESENT | page::WRITABLE | page::USER;

#[test]
fn map_page_installs_a_translation() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let a = spawn(&mut k);
    run(&mut k, &mut cpu, a);

    assert_eq!(call(&mut k, Sysno::MapPage, 0x50_0000, 0x4000_0000, RW_USER), Outcome::Complete(OK));
    let t = k
        .scheduler()
        .process(a)
        .unwrap()
        .space()
        .translate(k.mapper(), VirtualAddress::new(0x50_0123))
        .unwrap();
    assert_eq!(t.address, PhysicalAddress::new(0x4000_0123));
    assert_eq!(t.flags, MapFlags::PRESENT | MapFlags::WRITABLE | MapFlags::USER);

    k.copy_to_user(a, VirtualAddress::new(0x50_0000), b"mapped").unwrap();
}

#[test]
fn map_page_rejects_bad_arguments() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let a = spawn(&mut k);
    run(&mut k, &mut cpu, a);
    let free = k.frames().free_frames();

    for (va, pa, flags) in [
        (0x50_0001, 0x4000_0000, RW_USER),
        (0x50_0000, 0x4000_0000, 1 << 5),
        (KERNEL_BASE, 0x4000_0000, RW_USER),
        (0x50_0000, 1 << 52, RW_USER),
    ] {
        assert_eq!(call(&mut k, Sysno::MapPage, va, pa, flags), Outcome::Complete(ERR_INVALID));
    }
    assert_eq!(k.frames().free_frames(), free);
}

#[test]
fn yielding_rotates_round_robin() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let pids = [spawn(&mut k), spawn(&mut k), spawn(&mut k)];

    let mut order = Vec::new();
    k.reschedule(&mut cpu).unwrap();
    for _ in 0..9 {
        order.push(k.current());
        assert_eq!(call(&mut k, Sysno::Yield, 0, 0, 0), Outcome::Yield);
        k.reschedule(&mut cpu).unwrap();
    }
    let expected: Vec<_> = pids.iter().copied().cycle().take(9).collect();
    assert_eq!(order, expected);
}

#[test]
fn exit_releases_everything_on_a_later_reschedule() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let free = k.frames().free_frames();
    let a = spawn(&mut k);
    assert!(k.frames().free_frames() < free);

    run(&mut k, &mut cpu, a);
    assert_eq!(call(&mut k, Sysno::Exit, 0, 0, 0), Outcome::Exited);
    assert_eq!(k.scheduler().state(a), Some(ProcessState::Terminated));

    k.reschedule(&mut cpu).unwrap();
    assert!(k.current().is_idle());
    assert!(k.scheduler().process(a).is_some(), "still running when reaping started");

    k.reschedule(&mut cpu).unwrap();
    assert!(k.scheduler().process(a).is_none());
    assert_eq!(k.frames().free_frames(), free);
}

#[test]
fn idle_cannot_exit() {
    let mut k = kernel();
    assert_eq!(call(&mut k, Sysno::Exit, 0, 0, 0), Outcome::Complete(ERR_INVALID_PROCESS));
}

#[test]
fn unknown_syscalls_are_invalid() {
    let mut k = kernel();
    let args = SyscallArgs {
        sysno: 99,
        ..SyscallArgs::default()
    };
    assert_eq!(k.dispatch(args), Outcome::Complete(ERR_INVALID));
}

#[test]
fn kernel_mappings_reach_new_processes() {
    let mut k = kernel();
    k.map_kernel(
        VirtualAddress::new(KERNEL_BASE),
        PhysicalAddress::new(0x20_0000),
        MapFlags::WRITABLE,
    )
    .unwrap();
    let a = spawn(&mut k);

    let sched = k.scheduler();
    let kernel_space = sched.kernel_space().unwrap();
    let space = sched.process(a).unwrap().space();
    assert_eq!(space.kernel_window(k.mapper()), kernel_space.kernel_window(k.mapper()));
    assert_eq!(
        space
            .translate(k.mapper(), VirtualAddress::new(KERNEL_BASE))
            .map(|t| t.address),
        Some(PhysicalAddress::new(0x20_0000))
    );
}

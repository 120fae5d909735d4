mod common;

use common::{RecordingCpu, call, kernel, run, spawn};
use kernel::Outcome;
use kernel_info::limits::TIMER_IRQ;
use kernel_sched::{BlockReason, ProcessState};
use stdlib::syscall_abi::{ERR_INVALID, ERR_INVALID_PROCESS, ERR_TIMEOUT, ERR_WOULD_BLOCK, IrqWaitFlags, OK, Sysno};

const CLEAR: u64 = IrqWaitFlags::CLEAR.bits();
const NO_WAIT: u64 = IrqWaitFlags::NO_WAIT.bits();

#[test]
fn occurrence_wakes_exactly_the_waiter() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let (a, b, c) = (spawn(&mut k), spawn(&mut k), spawn(&mut k));

    run(&mut k, &mut cpu, a);
    assert_eq!(call(&mut k, Sysno::IrqWait, 3, 0, 0), Outcome::Blocked { restart: false });
    run(&mut k, &mut cpu, b);
    assert_eq!(call(&mut k, Sysno::IrqWait, 4, 0, 0), Outcome::Blocked { restart: false });
    run(&mut k, &mut cpu, c);

    assert_eq!(
        k.scheduler().process(a).unwrap().block_reason(),
        Some(BlockReason::Irq(3))
    );
    assert_eq!(k.interrupt(3), 1);
    assert_eq!(k.scheduler().state(a), Some(ProcessState::Ready));
    assert_eq!(k.scheduler().state(b), Some(ProcessState::Blocked));
    assert_eq!(k.scheduler().ready_ids().collect::<Vec<_>>(), [a]);
    assert_eq!(k.take_wake_result(a), Some(OK));
    assert!(k.irq_wait().waiter(a, 3).is_none());
    assert!(k.irq_wait().waiter(b, 4).is_some());

    run(&mut k, &mut cpu, a);
    assert_eq!(k.current(), a);
}

#[test]
fn wait_times_out_on_the_timer_tick() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let (a, b) = (spawn(&mut k), spawn(&mut k));

    run(&mut k, &mut cpu, a);
    k.clock().set(1_000);
    assert_eq!(call(&mut k, Sysno::IrqWait, 3, 0, 50), Outcome::Blocked { restart: false });
    run(&mut k, &mut cpu, b);

    k.clock().set(1_049);
    assert_eq!(k.interrupt(TIMER_IRQ), 0);
    assert_eq!(k.scheduler().state(a), Some(ProcessState::Blocked));

    k.clock().set(1_050);
    assert_eq!(k.interrupt(TIMER_IRQ), 1);
    assert_eq!(k.scheduler().state(a), Some(ProcessState::Ready));
    assert_eq!(k.take_wake_result(a), Some(ERR_TIMEOUT));
    assert_eq!(k.irq_wait().waiting(), 0);
}

#[test]
fn reschedule_sweeps_timeouts_too() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let a = spawn(&mut k);

    run(&mut k, &mut cpu, a);
    call(&mut k, Sysno::IrqWait, 9, 0, 20);
    k.reschedule(&mut cpu).unwrap();
    assert!(k.current().is_idle());

    k.clock().advance(20);
    assert_eq!(k.reschedule(&mut cpu).unwrap(), a);
    assert_eq!(k.take_wake_result(a), Some(ERR_TIMEOUT));
}

#[test]
fn zero_timeout_waits_forever() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let a = spawn(&mut k);

    run(&mut k, &mut cpu, a);
    call(&mut k, Sysno::IrqWait, 3, 0, 0);
    k.clock().set(u64::MAX / 2);
    k.interrupt(TIMER_IRQ);
    assert_eq!(k.scheduler().state(a), Some(ProcessState::Blocked));
}

#[test]
fn no_wait_returns_would_block_without_a_waiter() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let a = spawn(&mut k);

    run(&mut k, &mut cpu, a);
    assert_eq!(call(&mut k, Sysno::IrqWait, 3, NO_WAIT, 0), Outcome::Complete(ERR_WOULD_BLOCK));
    assert_eq!(k.irq_wait().waiting(), 0);
    assert_eq!(k.scheduler().state(a), Some(ProcessState::Running));
}

#[test]
fn latched_occurrence_is_consumed_with_clear() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let a = spawn(&mut k);
    run(&mut k, &mut cpu, a);

    k.interrupt(5);
    assert_eq!(call(&mut k, Sysno::IrqWait, 5, 0, 0), Outcome::Complete(OK));
    assert_eq!(k.irq_wait().occurred(5), Ok(true));
    assert_eq!(call(&mut k, Sysno::IrqWait, 5, CLEAR | NO_WAIT, 0), Outcome::Complete(OK));
    assert_eq!(call(&mut k, Sysno::IrqWait, 5, NO_WAIT, 0), Outcome::Complete(ERR_WOULD_BLOCK));
}

#[test]
fn invalid_arguments_are_rejected() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let a = spawn(&mut k);
    run(&mut k, &mut cpu, a);

    assert_eq!(call(&mut k, Sysno::IrqWait, 16, 0, 0), Outcome::Complete(ERR_INVALID));
    assert_eq!(call(&mut k, Sysno::IrqWait, 3, 1 << 7, 0), Outcome::Complete(ERR_INVALID));
    assert_eq!(call(&mut k, Sysno::IrqGetCount, 300, 0, 0), Outcome::Complete(ERR_INVALID));
    assert_eq!(call(&mut k, Sysno::IrqResetCount, 16, 0, 0), Outcome::Complete(ERR_INVALID));
    assert_eq!(k.irq_wait().waiting(), 0);
}

#[test]
fn counters_are_queryable_and_resettable() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let a = spawn(&mut k);
    run(&mut k, &mut cpu, a);

    for _ in 0..3 {
        k.interrupt(7);
    }
    assert_eq!(call(&mut k, Sysno::IrqGetCount, 7, 0, 0), Outcome::Complete(3));
    assert_eq!(call(&mut k, Sysno::IrqResetCount, 7, 0, 0), Outcome::Complete(3));
    assert_eq!(call(&mut k, Sysno::IrqGetCount, 7, 0, 0), Outcome::Complete(0));
}

#[test]
fn idle_may_poll_but_not_block() {
    let mut k = kernel();
    assert!(k.current().is_idle());

    assert_eq!(call(&mut k, Sysno::IrqWait, 3, 0, 0), Outcome::Complete(ERR_INVALID_PROCESS));
    assert_eq!(call(&mut k, Sysno::IrqWait, 3, NO_WAIT, 0), Outcome::Complete(ERR_WOULD_BLOCK));
    k.interrupt(3);
    assert_eq!(call(&mut k, Sysno::IrqWait, 3, 0, 0), Outcome::Complete(OK));
    assert_eq!(k.irq_wait().waiting(), 0);
}

#[test]
fn exit_cancels_pending_waits() {
    let mut k = kernel();
    let mut cpu = RecordingCpu::default();
    let (a, b) = (spawn(&mut k), spawn(&mut k));

    run(&mut k, &mut cpu, a);
    call(&mut k, Sysno::IrqWait, 3, 0, 0);
    run(&mut k, &mut cpu, b);

    k.exit(a).unwrap();
    assert_eq!(k.irq_wait().waiting(), 0);
    assert_eq!(k.interrupt(3), 0);
    assert_eq!(k.scheduler().state(a), Some(ProcessState::Terminated));
}

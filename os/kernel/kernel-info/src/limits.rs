//! # Fixed Capacities

/// Number of legacy PIC interrupt lines a process can wait on.
pub const IRQ_LINES: usize = 16;

/// The interrupt line of the system timer; its occurrences drive the
/// timeout sweep of blocked IRQ waiters.
pub const TIMER_IRQ: u8 = 0;

/// Period of the system timer, in milliseconds.
pub const TIMER_PERIOD_MS: u64 = 10;

/// Vector of IRQ line `0` after the PIC has been remapped.
pub const IRQ_VECTOR_BASE: u8 = 32;

/// Vector of the `int 0x80` syscall gate.
pub const SYSCALL_VECTOR: u8 = 0x80;

/// Capacity of the IRQ waiter table.
pub const MAX_IRQ_WAITERS: usize = 32;

/// Number of message slots in the IPC ring buffer.
pub const IPC_QUEUE_CAPACITY: usize = 32;

/// Fixed payload size of an IPC message, in bytes.
pub const IPC_PAYLOAD_SIZE: usize = 256;

/// Upper bound on live processes, the idle process included.
pub const MAX_PROCESSES: usize = 64;

const _: () = {
    assert!((TIMER_IRQ as usize) < IRQ_LINES);
    assert!(IRQ_LINES <= u8::MAX as usize);
    assert!(IRQ_VECTOR_BASE as usize + IRQ_LINES <= SYSCALL_VECTOR as usize);
    assert!(IPC_PAYLOAD_SIZE <= u32::MAX as usize);
};

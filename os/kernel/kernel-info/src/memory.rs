//! # Memory Layout

/// Size of a physical frame and of a virtual page.
pub const PAGE_SIZE: u64 = 4096;

/// log2([`PAGE_SIZE`]).
pub const PAGE_SHIFT: u32 = 12;

/// Number of entries in every page-table level (9 index bits per level).
pub const TABLE_ENTRIES: usize = 512;

/// First physical byte handed out by the frame allocator.
pub const MANAGED_MEMORY_START: u64 = 0x0010_0000; // 1 MiB

/// Size of the physical range handed out by the frame allocator.
pub const MANAGED_MEMORY_SIZE: u64 = 16 * 1024 * 1024; // 16 MiB

/// Exclusive end of the managed physical range.
pub const MANAGED_MEMORY_END: u64 = MANAGED_MEMORY_START + MANAGED_MEMORY_SIZE;

/// Number of frames tracked by the allocator bitmap.
pub const MANAGED_FRAMES: usize = (MANAGED_MEMORY_SIZE / PAGE_SIZE) as usize;

/// Exclusive upper bound of physical addresses a page-table entry can hold
/// (bits 12..52 of an entry).
pub const PHYSICAL_ADDRESS_LIMIT: u64 = 1 << 52;

/// Exclusive end of the per-process user window (lower canonical half).
pub const USER_WINDOW_END: u64 = 0x0000_8000_0000_0000;

/// Start of the kernel window (upper canonical half).
pub const KERNEL_WINDOW_BASE: u64 = 0xffff_8000_0000_0000;

/// First PML4 slot belonging to the kernel window.
pub const KERNEL_WINDOW_FIRST_SLOT: usize = 256;

/// A simple Higher Half Direct Map (HHDM) base.
/// Anything you map at [`HHDM_BASE`] + `pa` lets the kernel
/// access physical memory via a fixed offset.
pub const HHDM_BASE: u64 = 0xffff_8880_0000_0000;

/// Where the kernel executes (VMA).
pub const KERNEL_BASE: u64 = 0xffff_ffff_8000_0000;

/// Virtual base of the stack page mapped into every new process.
pub const USER_STACK_BASE: u64 = 0x0100_0000;

/// Initial stack pointer of a new process (one past the stack page).
pub const USER_STACK_TOP: u64 = USER_STACK_BASE + PAGE_SIZE;

const _: () = {
    assert!(PAGE_SIZE == 1 << PAGE_SHIFT);
    assert!(MANAGED_MEMORY_START.is_multiple_of(PAGE_SIZE));
    assert!(MANAGED_MEMORY_SIZE.is_multiple_of(PAGE_SIZE));
    assert!(USER_STACK_BASE.is_multiple_of(PAGE_SIZE));
    assert!(USER_STACK_TOP <= USER_WINDOW_END);
    assert!(HHDM_BASE >= KERNEL_WINDOW_BASE);
    assert!(KERNEL_BASE > HHDM_BASE);
    assert!(((KERNEL_WINDOW_BASE >> 39) & 0x1ff) == KERNEL_WINDOW_FIRST_SLOT as u64);
};

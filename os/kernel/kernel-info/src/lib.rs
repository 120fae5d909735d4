//! # Kernel Configuration
//!
//! Single source of truth for the layout and capacity constants shared by
//! the memory, scheduling, IPC and interrupt-wait crates.
//!
//! ## Virtual Memory Layout
//!
//! Every address space is split at the canonical hole. The lower half is the
//! per-process **user window**, the upper half is the **kernel window** whose
//! top-level (PML4) entries are copied verbatim into each new address space.
//!
//! ```text
//! 0x0000_0000_0000_0000 ┌─────────────────────────────────┐
//!                       │         User Window             │
//! USER_STACK_BASE       │   one stack page per process    │ 0x0000_0000_0100_0000
//!                       │                                 │
//! USER_WINDOW_END       ├─────────────────────────────────┤ 0x0000_8000_0000_0000
//!                       │   (non-canonical hole)          │
//! KERNEL_WINDOW_BASE    ├─────────────────────────────────┤ 0xffff_8000_0000_0000
//!                       │   Higher Half Direct Mapping    │ HHDM_BASE
//!                       │   Kernel Text & Data            │ KERNEL_BASE
//! 0xFFFF_FFFF_FFFF_FFFF └─────────────────────────────────┘
//! ```
//!
//! ## Physical Memory Layout
//!
//! ```text
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │     Low Memory (< 1MiB)         │
//! 0x0010_0000 ├─────────────────────────────────┤ MANAGED_MEMORY_START
//!             │  Frames handed out by the       │
//!             │  bitmap frame allocator         │
//! 0x0110_0000 └─────────────────────────────────┘ MANAGED_MEMORY_END
//! ```
//!
//! ## Capacities
//!
//! The [`limits`] module fixes the sizes of the statically bounded tables:
//! IRQ lines, IRQ waiters, IPC ring slots, message payloads and processes.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod limits;
pub mod memory;

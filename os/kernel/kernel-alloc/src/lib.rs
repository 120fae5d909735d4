//! # Kernel Physical Memory
//!
//! The two lowest layers of the memory stack:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │           Address Space Manager (kernel-vmem)       │
//! │    • page table walks and mapping                   │
//! └───────────┬───────────────────────┬─────────────────┘
//!             │ FrameAlloc            │ PhysMapper
//! ┌───────────▼───────────┐ ┌─────────▼─────────────────┐
//! │  Physical Frame       │ │  Physical Mapper          │
//! │  Allocator            │ │  • HHDM: frame at         │
//! │  • 4 KiB frames       │ │    HHDM_BASE + pa         │
//! │  • bitmap, no heap    │ │                           │
//! └───────────────────────┘ └───────────────────────────┘
//! ```
//!
//! ### Physical Frame Allocator ([`frame_alloc`])
//!
//! One bit per frame over the managed range
//! (`MANAGED_MEMORY_START`, 16 MiB by default). Allocation scans forward
//! from a cursor; freeing moves the cursor back so the freed frame is found
//! again. Freeing a frame outside the range or one that is already free is
//! logged and otherwise ignored: double frees are tolerated, not detected as
//! errors.
//!
//! ### Physical Mapper ([`phys_mapper`])
//!
//! Reaches a physical frame through the higher-half direct map. Only usable
//! on the bare-metal target; hosted code uses `kernel_vmem::FrameArena`.
//!
//! ## Usage
//! ```rust
//! use kernel_alloc::frame_alloc::BitmapFrameAlloc;
//! use kernel_vmem::FrameAlloc;
//!
//! let mut frames = BitmapFrameAlloc::new();
//! let frame = frames.alloc_4k().unwrap();
//! assert!(frames.is_allocated(frame));
//! frames.free_4k(frame);
//! assert_eq!(frames.alloc_4k(), Some(frame));
//! ```
//!
//! ## Performance Characteristics
//!
//! * **Allocation**: O(n) worst case, full bitmap words are skipped
//! * **Free**: O(1)
//! * **Memory Overhead**: 1 bit per 4 KiB frame

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod frame_alloc;
pub mod phys_mapper;

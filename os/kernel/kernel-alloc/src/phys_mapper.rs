//! # HHDM-based [`PhysMapper`]
//!
//! With a higher-half direct map every physical address `pa` is mapped at
//! `HHDM_BASE + pa`, so reaching a frame is one addition.

use kernel_info::memory::HHDM_BASE;
use kernel_memory_addresses::PhysicalFrame;
use kernel_vmem::{Frame, PhysMapper};

/// [`PhysMapper`] for kernels with a higher-half direct map (HHDM).
pub struct HhdmPhysMapper {
    _private: (),
}

impl HhdmPhysMapper {
    /// # Safety
    /// The direct map must be active, writable, and cover every frame passed
    /// to this mapper for as long as it is used. No other alias may write a
    /// frame while a reference handed out here is alive.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    #[inline]
    const fn address(frame: PhysicalFrame) -> u64 {
        HHDM_BASE + frame.base().as_u64()
    }
}

#[allow(unsafe_code)]
impl PhysMapper for HhdmPhysMapper {
    fn frame(&self, frame: PhysicalFrame) -> &Frame {
        // SAFETY: guaranteed by the contract of `new`.
        unsafe { &*(Self::address(frame) as *const Frame) }
    }

    fn frame_mut(&mut self, frame: PhysicalFrame) -> &mut Frame {
        // SAFETY: guaranteed by the contract of `new`.
        unsafe { &mut *(Self::address(frame) as *mut Frame) }
    }
}

//! Heap-backed physical memory.

use crate::{Frame, PhysMapper};
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use kernel_memory_addresses::PhysicalFrame;

static ZERO_FRAME: Frame = Frame::zeroed();

/// Simulated physical memory for hosted builds.
///
/// Frames materialize on first write and read as zero until then. The arena
/// does not allocate frame numbers; pair it with a [`FrameAlloc`](crate::FrameAlloc)
/// that does.
#[derive(Default)]
pub struct FrameArena {
    frames: BTreeMap<PhysicalFrame, Box<Frame>>,
}

impl FrameArena {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames: BTreeMap::new(),
        }
    }

    /// Number of frames that have been written to.
    #[must_use]
    pub fn resident(&self) -> usize {
        self.frames.len()
    }

    /// Drop the backing storage of `frame`; it reads as zero afterwards.
    pub fn release(&mut self, frame: PhysicalFrame) -> bool {
        self.frames.remove(&frame).is_some()
    }
}

impl PhysMapper for FrameArena {
    fn frame(&self, frame: PhysicalFrame) -> &Frame {
        self.frames.get(&frame).map_or(&ZERO_FRAME, |f| f)
    }

    fn frame_mut(&mut self, frame: PhysicalFrame) -> &mut Frame {
        self.frames
            .entry(frame)
            .or_insert_with(|| Box::new(Frame::zeroed()))
    }
}

impl core::fmt::Debug for FrameArena {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameArena")
            .field("resident", &self.frames.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_frames_read_as_zero() {
        let arena = FrameArena::new();
        let f = PhysicalFrame::from_number(7);
        assert!(arena.frame(f).bytes().iter().all(|&b| b == 0));
        assert_eq!(arena.resident(), 0);
    }

    #[test]
    fn writes_persist_until_release() {
        let mut arena = FrameArena::new();
        let f = PhysicalFrame::from_number(7);
        arena.frame_mut(f).bytes_mut()[10] = 0xaa;
        assert_eq!(arena.frame(f).bytes()[10], 0xaa);
        assert!(arena.release(f));
        assert_eq!(arena.frame(f).bytes()[10], 0);
    }
}

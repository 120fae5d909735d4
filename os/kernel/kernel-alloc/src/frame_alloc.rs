//! Bitmap physical frame allocator.

use kernel_info::memory::{MANAGED_FRAMES, MANAGED_MEMORY_START, PAGE_SHIFT};
use kernel_memory_addresses::PhysicalFrame;
use kernel_vmem::FrameAlloc;
use log::{trace, warn};

const WORD_BITS: usize = u64::BITS as usize;
const BITMAP_WORDS: usize = MANAGED_FRAMES.div_ceil(WORD_BITS);

/// Tracks up to [`MANAGED_FRAMES`] contiguous frames, one bit each.
///
/// ### Invariants
/// - Every free frame index is `>= cursor`.
/// - `free` equals the number of clear bits below `frames`.
pub struct BitmapFrameAlloc {
    /// First managed frame number.
    base: u64,
    /// Number of managed frames.
    frames: usize,
    bitmap: [u64; BITMAP_WORDS],
    /// Lowest index that may be free.
    cursor: usize,
    free: usize,
}

impl Default for BitmapFrameAlloc {
    fn default() -> Self {
        Self::new()
    }
}

impl BitmapFrameAlloc {
    /// Manage the configured range starting at `MANAGED_MEMORY_START`.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_range(
            PhysicalFrame::from_number(MANAGED_MEMORY_START >> PAGE_SHIFT),
            MANAGED_FRAMES,
        )
    }

    /// Manage `frames` frames starting at `first`; clamped to the bitmap capacity.
    #[must_use]
    pub const fn with_range(first: PhysicalFrame, frames: usize) -> Self {
        let frames = if frames > MANAGED_FRAMES {
            MANAGED_FRAMES
        } else {
            frames
        };
        Self {
            base: first.number(),
            frames,
            bitmap: [0; BITMAP_WORDS],
            cursor: 0,
            free: frames,
        }
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.frames
    }

    #[inline]
    #[must_use]
    pub const fn free_frames(&self) -> usize {
        self.free
    }

    /// Whether `frame` is inside the managed range and currently handed out.
    #[must_use]
    pub fn is_allocated(&self, frame: PhysicalFrame) -> bool {
        self.index_of(frame).is_some_and(|i| self.test(i))
    }

    /// Reserve `frame` (e.g. memory in use before the allocator took over).
    ///
    /// Returns `false` if the frame is outside the range or already used.
    pub fn mark_used(&mut self, frame: PhysicalFrame) -> bool {
        match self.index_of(frame) {
            Some(i) if !self.test(i) => {
                self.set(i);
                self.free -= 1;
                true
            }
            _ => false,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn index_of(&self, frame: PhysicalFrame) -> Option<usize> {
        let n = frame.number().checked_sub(self.base)?;
        (n < self.frames as u64).then_some(n as usize)
    }

    #[inline]
    const fn test(&self, i: usize) -> bool {
        self.bitmap[i / WORD_BITS] & (1 << (i % WORD_BITS)) != 0
    }

    #[inline]
    const fn set(&mut self, i: usize) {
        self.bitmap[i / WORD_BITS] |= 1 << (i % WORD_BITS);
    }

    #[inline]
    const fn clear(&mut self, i: usize) {
        self.bitmap[i / WORD_BITS] &= !(1 << (i % WORD_BITS));
    }

    /// First clear bit at or after the cursor.
    fn find_free(&self) -> Option<usize> {
        let mut i = self.cursor;
        while i < self.frames {
            if self.bitmap[i / WORD_BITS] == u64::MAX {
                i = (i / WORD_BITS + 1) * WORD_BITS;
                continue;
            }
            if !self.test(i) {
                return Some(i);
            }
            i += 1;
        }
        None
    }
}

impl FrameAlloc for BitmapFrameAlloc {
    fn alloc_4k(&mut self) -> Option<PhysicalFrame> {
        let Some(i) = self.find_free() else {
            warn!("physical frame allocator exhausted");
            return None;
        };
        self.set(i);
        self.cursor = i + 1;
        self.free -= 1;

        let frame = PhysicalFrame::from_number(self.base + i as u64);
        trace!("alloc frame {frame}");
        Some(frame)
    }

    fn free_4k(&mut self, frame: PhysicalFrame) {
        let Some(i) = self.index_of(frame) else {
            warn!("free of unmanaged frame {frame} ignored");
            return;
        };
        if !self.test(i) {
            warn!("double free of frame {frame} ignored");
            return;
        }
        self.clear(i);
        self.free += 1;
        if i < self.cursor {
            self.cursor = i;
        }
        trace!("free frame {frame}");
    }
}

impl core::fmt::Debug for BitmapFrameAlloc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BitmapFrameAlloc")
            .field("base", &PhysicalFrame::from_number(self.base))
            .field("frames", &self.frames)
            .field("free", &self.free)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

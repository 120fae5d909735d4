use crate::{Context, InterruptFrame};

/// Backing memory for the saved-frame slots a [`Context`] points at.
///
/// The bare-metal kernel reads and writes the slot in the process's stack
/// page; tests keep frames in a table.
pub trait FrameStore {
    fn store(&mut self, slot: u64, frame: &InterruptFrame);
    fn load(&mut self, slot: u64) -> InterruptFrame;
}

/// Frame bookkeeping of a switch that works by rewriting the interrupt
/// frame the CPU returns through.
///
/// A context with `rsp == 0` is the idle process, which has no slot; its
/// frame is parked in `idle` instead.
pub struct FrameSwitch<'a> {
    live: &'a mut InterruptFrame,
    idle: &'a mut InterruptFrame,
}

impl<'a> FrameSwitch<'a> {
    pub const fn new(live: &'a mut InterruptFrame, idle: &'a mut InterruptFrame) -> Self {
        Self { live, idle }
    }

    pub const fn live(&mut self) -> &mut InterruptFrame {
        &mut *self.live
    }

    /// Park the live frame as `prev`'s saved state.
    pub fn save<S: FrameStore + ?Sized>(&mut self, prev: &Context, store: &mut S) {
        if prev.rsp == 0 {
            *self.idle = *self.live;
        } else {
            store.store(prev.rsp, self.live);
        }
    }

    /// Make `next`'s saved state the live frame, confined to its privilege.
    pub fn restore<S: FrameStore + ?Sized>(&mut self, next: &Context, store: &mut S) {
        let mut frame = if next.rsp == 0 {
            *self.idle
        } else {
            store.load(next.rsp)
        };
        frame.confine(next.privilege);
        *self.live = frame;
    }
}

use kernel_memory_addresses::PhysicalFrame;
use kernel_registers::StoreRegisterUnsafe;
use kernel_registers::cr3::Cr3;
use kernel_sched::{Context, Cpu, FrameStore, FrameSwitch, InterruptFrame};

/// [`Cpu`] that switches by rewriting the live interrupt frame.
///
/// `activate` only records the root; it is loaded in `switch_context`
/// after the outgoing frame has been stored through the old tables.
pub struct HwCpu<'a> {
    frames: FrameSwitch<'a>,
    root: Option<PhysicalFrame>,
}

impl<'a> HwCpu<'a> {
    pub const fn new(live: &'a mut InterruptFrame, idle: &'a mut InterruptFrame) -> Self {
        Self {
            frames: FrameSwitch::new(live, idle),
            root: None,
        }
    }

    pub const fn live(&mut self) -> &mut InterruptFrame {
        self.frames.live()
    }
}

/// Saved-frame slots at the top of each process's stack page, addressed
/// through the currently active tables.
struct StackSlots;

impl StackSlots {
    #[allow(clippy::cast_possible_truncation)]
    fn slot(rsp: u64) -> *mut InterruptFrame {
        core::ptr::with_exposed_provenance_mut(rsp as usize)
    }
}

impl FrameStore for StackSlots {
    fn store(&mut self, slot: u64, frame: &InterruptFrame) {
        // SAFETY: the slot is mapped writable in the still active space of its owner.
        unsafe { Self::slot(slot).write_volatile(*frame) };
    }

    fn load(&mut self, slot: u64) -> InterruptFrame {
        // SAFETY: the slot is mapped in the space just activated.
        unsafe { Self::slot(slot).read_volatile() }
    }
}

impl Cpu for HwCpu<'_> {
    fn activate(&mut self, root: PhysicalFrame) {
        self.root = Some(root);
    }

    fn switch_context(&mut self, prev: &mut Context, next: &Context) {
        self.frames.save(prev, &mut StackSlots);

        if let Some(root) = self.root.take() {
            // SAFETY: every process space carries the kernel window, which
            // holds this code and the interrupt stack.
            unsafe { Cr3::from_root(root).store_unsafe() };
        }

        self.frames.restore(next, &mut StackSlots);
    }
}

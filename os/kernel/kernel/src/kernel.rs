use crate::clock::Clock;
use crate::irq_wait::IrqWait;
use crate::KernelError;
use kernel_alloc::frame_alloc::BitmapFrameAlloc;
use kernel_info::limits::TIMER_IRQ;
use kernel_ipc::MessageQueue;
use kernel_memory_addresses::{PhysicalAddress, PhysicalFrame, VirtualAddress};
use kernel_sched::{Cpu, Privilege, ProcessId, SchedError, Scheduler};
use kernel_vmem::{AddressSpace, MapFlags, PhysMapper, SpaceKind};
use log::{debug, info, trace};

/// Every manager of the kernel core, owned in one place.
///
/// All operations take `&mut self`; the bare-metal glue keeps the kernel
/// behind an interrupt-disabling lock, which makes each call one critical
/// section.
pub struct Kernel<M: PhysMapper, C: Clock> {
    pub(crate) frames: BitmapFrameAlloc,
    pub(crate) mapper: M,
    pub(crate) sched: Scheduler,
    pub(crate) ipc: MessageQueue,
    pub(crate) irq: IrqWait,
    pub(crate) clock: C,
}

impl<M: PhysMapper, C: Clock> Kernel<M, C> {
    /// Build a kernel with a fresh, empty kernel address space.
    ///
    /// # Errors
    /// [`KernelError::Map`] if no frame is available for the root table.
    pub fn new(mut mapper: M, mut frames: BitmapFrameAlloc, clock: C) -> Result<Self, KernelError> {
        let space = AddressSpace::new_kernel(&mut mapper, &mut frames)?;
        Ok(Self::with_space(mapper, frames, clock, space))
    }

    /// Build a kernel around the page tables rooted at `root`, typically
    /// the ones the loader left in CR3. `root` must not be managed by `frames`.
    #[must_use]
    pub fn adopt(mapper: M, frames: BitmapFrameAlloc, clock: C, root: PhysicalFrame) -> Self {
        Self::with_space(mapper, frames, clock, AddressSpace::from_root(root, SpaceKind::Kernel))
    }

    fn with_space(mapper: M, frames: BitmapFrameAlloc, clock: C, space: AddressSpace) -> Self {
        info!(
            "kernel core up: root {}, {} free frames",
            space.root(),
            frames.free_frames()
        );
        Self {
            frames,
            mapper,
            sched: Scheduler::new(space),
            ipc: MessageQueue::new(),
            irq: IrqWait::new(),
            clock,
        }
    }

    /// Map one page into the kernel window. Processes created afterwards see
    /// it; existing ones do if it lands in an already populated PML4 slot.
    ///
    /// # Errors
    /// Whatever [`AddressSpace::map`] reports, or a fatal scheduler error.
    pub fn map_kernel(
        &mut self,
        va: VirtualAddress,
        pa: PhysicalAddress,
        flags: MapFlags,
    ) -> Result<(), KernelError> {
        let space = self.sched.kernel_space()?;
        space.map(&mut self.mapper, &mut self.frames, va, pa, flags)?;
        Ok(())
    }

    /// Create a ready process starting at `entry`.
    ///
    /// # Errors
    /// See [`Scheduler::create`].
    pub fn spawn(&mut self, entry: VirtualAddress, privilege: Privilege) -> Result<ProcessId, KernelError> {
        let pid = self
            .sched
            .create(entry, privilege, &mut self.mapper, &mut self.frames)?;
        Ok(pid)
    }

    /// An interrupt arrived on `irq`. Wakes its waiters; the timer line also
    /// advances the clock and sweeps timeouts. Returns how many processes
    /// became ready. Never switches.
    pub fn interrupt(&mut self, irq: u8) -> usize {
        let mut woken = self.irq.notify(irq, &mut self.sched);
        if irq == TIMER_IRQ {
            self.clock.on_timer_tick();
            woken += self.expire_timeouts();
        }
        woken
    }

    /// Wake every IRQ waiter whose timeout has passed.
    pub fn expire_timeouts(&mut self) -> usize {
        let now = self.clock.now_ms();
        self.irq.expire(now, &mut self.sched)
    }

    /// The cooperative switch point: sweep timeouts, release terminated
    /// processes, then rotate to the next ready process.
    ///
    /// # Errors
    /// Only fatal scheduler errors.
    pub fn reschedule<P: Cpu>(&mut self, cpu: &mut P) -> Result<ProcessId, KernelError> {
        self.expire_timeouts();
        let reaped = self.sched.reap(&self.mapper, &mut self.frames);
        if reaped > 0 {
            trace!("reaped {reaped} processes");
        }
        Ok(self.sched.schedule(cpu)?)
    }

    /// Terminate `pid` and drop its IRQ waits. Its memory is released by a
    /// later [`reschedule`](Self::reschedule), once it no longer runs.
    ///
    /// # Errors
    /// [`SchedError::IdleProcess`], [`SchedError::NoSuchProcess`] or
    /// [`SchedError::InvalidState`] if already terminated.
    pub fn exit(&mut self, pid: ProcessId) -> Result<(), KernelError> {
        self.sched.terminate(pid)?;
        let cancelled = self.irq.cancel(pid);
        debug!("process {pid} exited ({cancelled} waits cancelled)");
        Ok(())
    }

    /// The result a woken process's blocked syscall returns, if it has one.
    pub fn take_wake_result(&mut self, pid: ProcessId) -> Option<i64> {
        self.sched.take_wake_result(pid)
    }

    /// Copy `bytes` into `pid`'s user memory.
    ///
    /// # Errors
    /// [`SchedError::NoSuchProcess`] or the copy's [`MapError`](kernel_vmem::MapError).
    pub fn copy_to_user(&mut self, pid: ProcessId, va: VirtualAddress, bytes: &[u8]) -> Result<(), KernelError> {
        let process = self.sched.process(pid).ok_or(SchedError::NoSuchProcess)?;
        process
            .space()
            .write_with(&mut self.mapper, va, bytes, process.privilege().access())?;
        Ok(())
    }

    /// Copy `buf.len()` bytes out of `pid`'s user memory.
    ///
    /// # Errors
    /// [`SchedError::NoSuchProcess`] or the copy's [`MapError`](kernel_vmem::MapError).
    pub fn copy_from_user(&self, pid: ProcessId, va: VirtualAddress, buf: &mut [u8]) -> Result<(), KernelError> {
        let process = self.sched.process(pid).ok_or(SchedError::NoSuchProcess)?;
        process
            .space()
            .read_with(&self.mapper, va, buf, process.privilege().access())?;
        Ok(())
    }

    #[must_use]
    pub const fn current(&self) -> ProcessId {
        self.sched.current()
    }

    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.sched
    }

    #[must_use]
    pub const fn ipc(&self) -> &MessageQueue {
        &self.ipc
    }

    #[must_use]
    pub const fn irq_wait(&self) -> &IrqWait {
        &self.irq
    }

    #[must_use]
    pub const fn frames(&self) -> &BitmapFrameAlloc {
        &self.frames
    }

    #[must_use]
    pub const fn mapper(&self) -> &M {
        &self.mapper
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }
}

impl<M: PhysMapper, C: Clock> core::fmt::Debug for Kernel<M, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Kernel")
            .field("sched", &self.sched)
            .field("queued", &self.ipc.len())
            .field("waiters", &self.irq.waiting())
            .field("free_frames", &self.frames.free_frames())
            .finish_non_exhaustive()
    }
}

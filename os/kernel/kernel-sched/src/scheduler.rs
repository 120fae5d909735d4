use crate::{
    BlockReason, Context, Cpu, FatalError, InterruptFrame, Privilege, Process, ProcessId,
    ProcessState, SchedError, Waker,
};
use alloc::boxed::Box;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;
use kernel_info::limits::MAX_PROCESSES;
use kernel_info::memory::{PAGE_SIZE, USER_STACK_BASE, USER_STACK_TOP};
use kernel_memory_addresses::VirtualAddress;
use kernel_vmem::{AddressSpace, FrameAlloc, MapFlags, PhysMapper};
use log::{debug, trace};

/// Round-robin scheduler over boxed process records.
///
/// ### Invariants
/// - Exactly one process is `Running`: the one named by `current`.
/// - `ready` holds every `Ready` process except idle, each exactly once.
/// - Records are boxed so a saved [`Context`] keeps its address while the
///   table changes.
pub struct Scheduler {
    processes: BTreeMap<ProcessId, Box<Process>>,
    ready: VecDeque<ProcessId>,
    current: ProcessId,
    next_id: u32,
    block_seq: u64,
}

impl Scheduler {
    /// Install the idle process, owning `kernel_space`, as the running process.
    #[must_use]
    pub fn new(kernel_space: AddressSpace) -> Self {
        let idle = Process {
            id: ProcessId::IDLE,
            state: ProcessState::Running,
            privilege: Privilege::Kernel,
            priority: 0,
            context: Context::default(),
            space: kernel_space,
            stack: None,
            block_reason: None,
            blocked_seq: 0,
            wake_result: None,
        };

        let mut processes = BTreeMap::new();
        processes.insert(ProcessId::IDLE, Box::new(idle));
        Self {
            processes,
            ready: VecDeque::with_capacity(MAX_PROCESSES),
            current: ProcessId::IDLE,
            next_id: 1,
            block_seq: 0,
        }
    }

    /// The kernel address space, owned by the idle process.
    ///
    /// # Errors
    /// [`FatalError::MissingKernelSpace`] if the idle record is gone.
    pub fn kernel_space(&self) -> Result<&AddressSpace, SchedError> {
        self.processes
            .get(&ProcessId::IDLE)
            .map(|p| &p.space)
            .ok_or(SchedError::Fatal(FatalError::MissingKernelSpace))
    }

    #[inline]
    #[must_use]
    pub const fn current(&self) -> ProcessId {
        self.current
    }

    #[must_use]
    pub fn process(&self, pid: ProcessId) -> Option<&Process> {
        self.processes.get(&pid).map(|p| &**p)
    }

    #[must_use]
    pub fn state(&self, pid: ProcessId) -> Option<ProcessState> {
        self.process(pid).map(Process::state)
    }

    /// Ready processes in the order they will be selected.
    pub fn ready_ids(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.ready.iter().copied()
    }

    /// Number of process records, idle and terminated ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Create a `Ready` process that starts executing at `entry`.
    ///
    /// Builds a process space inheriting the kernel window, maps one stack
    /// page at `USER_STACK_BASE` (user accessible only for
    /// [`Privilege::User`]) and writes an initial [`InterruptFrame`] at its
    /// top. That top slot holds the saved frame whenever the process is
    /// switched out; the process's own stack starts just below it. On
    /// failure everything allocated so far is released.
    ///
    /// # Errors
    /// - [`SchedError::TooManyProcesses`] at `MAX_PROCESSES` records, or
    ///   once the id space is used up.
    /// - [`SchedError::OutOfMemory`] if a frame cannot be allocated.
    pub fn create<M: PhysMapper, A: FrameAlloc>(
        &mut self,
        entry: VirtualAddress,
        privilege: Privilege,
        mapper: &mut M,
        alloc: &mut A,
    ) -> Result<ProcessId, SchedError> {
        if self.processes.len() >= MAX_PROCESSES {
            return Err(SchedError::TooManyProcesses);
        }
        // Ids are never reused; wrapping would hand out the idle id.
        let Some(following) = self.next_id.checked_add(1) else {
            return Err(SchedError::TooManyProcesses);
        };

        let space = AddressSpace::new_process(self.kernel_space()?, mapper, alloc)?;
        let Some(stack) = alloc.alloc_4k() else {
            space.destroy(mapper, alloc);
            return Err(SchedError::OutOfMemory);
        };

        let flags = match privilege {
            Privilege::Kernel => MapFlags::WRITABLE,
            Privilege::User => MapFlags::WRITABLE | MapFlags::USER,
        };
        let stack_va = VirtualAddress::new(USER_STACK_BASE);
        if let Err(e) = space.map(mapper, alloc, stack_va, stack.base(), flags) {
            alloc.free_4k(stack);
            space.destroy(mapper, alloc);
            return Err(e.into());
        }

        let slot = USER_STACK_TOP - InterruptFrame::SIZE as u64;
        let frame = InterruptFrame::initial(entry, VirtualAddress::new(slot), privilege);
        let offset = PAGE_SIZE as usize - InterruptFrame::SIZE;
        mapper.frame_mut(stack).bytes_mut()[offset..].copy_from_slice(&frame.to_bytes());

        let id = ProcessId::new(self.next_id);
        self.next_id = following;
        self.processes.insert(
            id,
            Box::new(Process {
                id,
                state: ProcessState::Ready,
                privilege,
                priority: 0,
                context: Context {
                    rsp: slot,
                    privilege,
                },
                space,
                stack: Some(stack),
                block_reason: None,
                blocked_seq: 0,
                wake_result: None,
            }),
        );
        self.ready.push_back(id);

        debug!("created process {id} ({privilege:?}) entry {entry}, stack {stack}");
        Ok(id)
    }

    /// Rotate: requeue the current process if it is still running, pick the
    /// head of the ready queue (idle if empty), activate its address space
    /// and switch to it.
    ///
    /// Returns the process that is running afterwards. No switch happens if
    /// that is the previous process.
    ///
    /// # Errors
    /// Only [`SchedError::Fatal`]: the scheduler state is inconsistent.
    pub fn schedule<C: Cpu>(&mut self, cpu: &mut C) -> Result<ProcessId, SchedError> {
        let prev = self.current;
        {
            let p = self
                .processes
                .get_mut(&prev)
                .ok_or(FatalError::MissingCurrent)?;
            if p.state == ProcessState::Running {
                p.state = ProcessState::Ready;
                if !prev.is_idle() {
                    self.ready.push_back(prev);
                }
            }
        }

        let next = match self.ready.pop_front() {
            Some(id) => id,
            None => ProcessId::IDLE,
        };
        let (next_context, next_root) = {
            let n = self
                .processes
                .get_mut(&next)
                .ok_or(FatalError::CorruptedQueue)?;
            if n.state != ProcessState::Ready {
                return Err(FatalError::CorruptedQueue.into());
            }
            n.state = ProcessState::Running;
            (n.context, n.space.root())
        };
        self.current = next;

        if next == prev {
            return Ok(next);
        }

        trace!("switch {prev} -> {next}");
        cpu.activate(next_root);
        // A previous process that was reaped or vanished has nothing to save.
        let mut scratch = Context::default();
        let prev_context = match self.processes.get_mut(&prev) {
            Some(p) => &mut p.context,
            None => &mut scratch,
        };
        cpu.switch_context(prev_context, &next_context);
        Ok(next)
    }

    /// Mark `pid` blocked for `reason` and take it off the ready queue.
    ///
    /// A blocked current process keeps running until the next
    /// [`schedule`](Self::schedule).
    ///
    /// # Errors
    /// [`SchedError::IdleProcess`], [`SchedError::NoSuchProcess`], or
    /// [`SchedError::InvalidState`] unless `pid` is ready or running.
    pub fn block(&mut self, pid: ProcessId, reason: BlockReason) -> Result<(), SchedError> {
        if pid.is_idle() {
            return Err(SchedError::IdleProcess);
        }
        let p = self
            .processes
            .get_mut(&pid)
            .ok_or(SchedError::NoSuchProcess)?;
        if !matches!(p.state, ProcessState::Ready | ProcessState::Running) {
            return Err(SchedError::InvalidState);
        }

        self.block_seq += 1;
        p.state = ProcessState::Blocked;
        p.block_reason = Some(reason);
        p.blocked_seq = self.block_seq;
        p.wake_result = None;
        self.ready.retain(|&id| id != pid);
        debug!("process {pid} blocked on {reason:?}");
        Ok(())
    }

    /// The process that has been blocked on `reason` the longest.
    #[must_use]
    pub fn longest_blocked(&self, reason: BlockReason) -> Option<ProcessId> {
        self.processes
            .values()
            .filter(|p| p.state == ProcessState::Blocked && p.block_reason == Some(reason))
            .min_by_key(|p| p.blocked_seq)
            .map(|p| p.id)
    }

    /// Take the result left by the waker, if any.
    pub fn take_wake_result(&mut self, pid: ProcessId) -> Option<i64> {
        self.processes.get_mut(&pid)?.wake_result.take()
    }

    /// Mark `pid` terminated. Its resources are released by [`reap`](Self::reap)
    /// once it is no longer running.
    ///
    /// # Errors
    /// [`SchedError::IdleProcess`], [`SchedError::NoSuchProcess`], or
    /// [`SchedError::InvalidState`] if already terminated.
    pub fn terminate(&mut self, pid: ProcessId) -> Result<(), SchedError> {
        if pid.is_idle() {
            return Err(SchedError::IdleProcess);
        }
        let p = self
            .processes
            .get_mut(&pid)
            .ok_or(SchedError::NoSuchProcess)?;
        if p.state == ProcessState::Terminated {
            return Err(SchedError::InvalidState);
        }
        p.state = ProcessState::Terminated;
        p.block_reason = None;
        p.wake_result = None;
        self.ready.retain(|&id| id != pid);
        debug!("process {pid} terminated");
        Ok(())
    }

    /// Release every terminated process other than the current one: its
    /// stack frame, its page tables and its record. Returns how many went.
    pub fn reap<M: PhysMapper, A: FrameAlloc>(&mut self, mapper: &M, alloc: &mut A) -> usize {
        let dead: Vec<ProcessId> = self
            .processes
            .values()
            .filter(|p| p.state == ProcessState::Terminated && p.id != self.current)
            .map(|p| p.id)
            .collect();

        for pid in &dead {
            if let Some(p) = self.processes.remove(pid) {
                let Process { space, stack, .. } = *p;
                if let Some(stack) = stack {
                    alloc.free_4k(stack);
                }
                space.destroy(mapper, alloc);
                debug!("reaped process {pid}");
            }
        }
        dead.len()
    }
}

impl Waker for Scheduler {
    fn wake(&mut self, pid: ProcessId, result: i64) -> bool {
        let Some(p) = self.processes.get_mut(&pid) else {
            return false;
        };
        if p.state != ProcessState::Blocked {
            return false;
        }
        p.state = ProcessState::Ready;
        p.block_reason = None;
        p.wake_result = Some(result);
        self.ready.push_back(pid);
        trace!("process {pid} woken ({result})");
        true
    }
}

impl core::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("current", &self.current)
            .field("ready", &self.ready)
            .field("processes", &self.processes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_alloc::frame_alloc::BitmapFrameAlloc;
    use kernel_memory_addresses::PhysicalFrame;
    use kernel_vmem::FrameArena;

    #[test]
    fn exhausted_ids_never_wrap_onto_idle() {
        let mut phys = FrameArena::new();
        let mut frames = BitmapFrameAlloc::with_range(PhysicalFrame::from_number(0x100), 64);
        let kernel = AddressSpace::new_kernel(&mut phys, &mut frames).unwrap();
        let kernel_root = kernel.root();
        let mut sched = Scheduler::new(kernel);
        let entry = VirtualAddress::new(0x40_0000);

        sched.next_id = u32::MAX - 1;
        let last = sched.create(entry, Privilege::User, &mut phys, &mut frames).unwrap();
        assert_eq!(last, ProcessId::new(u32::MAX - 1));

        let free = frames.free_frames();
        assert_eq!(
            sched.create(entry, Privilege::User, &mut phys, &mut frames),
            Err(SchedError::TooManyProcesses)
        );
        assert_eq!(frames.free_frames(), free);
        assert_eq!(sched.process(ProcessId::IDLE).unwrap().space().root(), kernel_root);
        assert_eq!(sched.process(ProcessId::IDLE).unwrap().state(), ProcessState::Running);
    }
}

use core::fmt;
use kernel_memory_addresses::PhysicalFrame;
use kernel_vmem::{AddressSpace, MapFlags};

/// Numeric process identifier. `0` is the idle process; others count up from 1.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ProcessId(u32);

impl ProcessId {
    pub const IDLE: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_idle(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid:{}", self.0)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProcessState {
    Ready,
    Running,
    Blocked,
    Terminated,
}

/// Why a process is blocked.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlockReason {
    /// Waiting for a message on the IPC queue.
    IpcReceive,
    /// Waiting for an occurrence of the given IRQ line.
    Irq(u8),
}

/// Ring a process executes in.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Privilege {
    #[default]
    Kernel,
    User,
}

impl Privilege {
    /// Page bits a buffer the process hands to the kernel must carry.
    ///
    /// Kernel-privileged processes run on supervisor pages, so presence is
    /// enough; user processes may only name user-accessible memory.
    #[must_use]
    pub const fn access(self) -> MapFlags {
        match self {
            Self::Kernel => MapFlags::empty(),
            Self::User => MapFlags::USER,
        }
    }
}

/// Saved execution state of a switched-out process.
///
/// The registers themselves live in an [`InterruptFrame`](crate::InterruptFrame)
/// on the process's stack; only the stack pointer is kept here.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Context {
    pub rsp: u64,
    /// Ring the saved frame must return to. The frame itself sits in
    /// process-writable memory, so restoring takes the selectors from here.
    pub privilege: Privilege,
}

/// A process record.
#[derive(Debug)]
pub struct Process {
    pub(crate) id: ProcessId,
    pub(crate) state: ProcessState,
    pub(crate) privilege: Privilege,
    /// Carried for future use; selection is strictly round-robin.
    pub(crate) priority: u8,
    pub(crate) context: Context,
    pub(crate) space: AddressSpace,
    /// Frame backing the stack page; `None` for the idle process.
    pub(crate) stack: Option<PhysicalFrame>,
    pub(crate) block_reason: Option<BlockReason>,
    /// Order in which processes blocked, for oldest-first wakeups.
    pub(crate) blocked_seq: u64,
    /// Result handed over by the waker, taken by the resumed syscall.
    pub(crate) wake_result: Option<i64>,
}

impl Process {
    #[must_use]
    pub const fn id(&self) -> ProcessId {
        self.id
    }

    #[must_use]
    pub const fn state(&self) -> ProcessState {
        self.state
    }

    #[must_use]
    pub const fn privilege(&self) -> Privilege {
        self.privilege
    }

    #[must_use]
    pub const fn priority(&self) -> u8 {
        self.priority
    }

    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    #[must_use]
    pub const fn space(&self) -> &AddressSpace {
        &self.space
    }

    #[must_use]
    pub const fn stack(&self) -> Option<PhysicalFrame> {
        self.stack
    }

    #[must_use]
    pub const fn block_reason(&self) -> Option<BlockReason> {
        self.block_reason
    }
}

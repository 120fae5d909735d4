use kernel_ipc::IpcError;
use kernel_sched::{FatalError, SchedError};
use kernel_vmem::MapError;
use stdlib::syscall_abi::{ERR_INVALID, ERR_INVALID_PROCESS, ERR_TIMEOUT, ERR_WOULD_BLOCK};

/// Why a syscall failed. [`code`](Self::code) is what the caller sees.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum SyscallError {
    #[error("invalid argument")]
    InvalidArgument,
    #[error("out of memory")]
    OutOfMemory,
    #[error("operation would block")]
    WouldBlock,
    #[error("wait timed out")]
    Timeout,
    #[error("calling process cannot do this")]
    InvalidProcess,
    #[error("message queue is full")]
    Full,
    #[error("message queue is empty")]
    Empty,
    #[error("user buffer is not accessible")]
    Fault,
}

impl SyscallError {
    /// The ABI return value.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::WouldBlock => ERR_WOULD_BLOCK,
            Self::Timeout => ERR_TIMEOUT,
            Self::InvalidProcess => ERR_INVALID_PROCESS,
            Self::InvalidArgument | Self::OutOfMemory | Self::Full | Self::Empty | Self::Fault => {
                ERR_INVALID
            }
        }
    }
}

impl From<MapError> for SyscallError {
    fn from(value: MapError) -> Self {
        match value {
            MapError::OutOfMemory => Self::OutOfMemory,
            MapError::NotMapped | MapError::AccessDenied => Self::Fault,
            MapError::VirtualOutOfRange
            | MapError::PhysicalOutOfRange
            | MapError::Unaligned
            | MapError::HugePage => Self::InvalidArgument,
        }
    }
}

impl From<IpcError> for SyscallError {
    fn from(value: IpcError) -> Self {
        match value {
            IpcError::Full => Self::Full,
            IpcError::Empty => Self::Empty,
            IpcError::InvalidLength => Self::InvalidArgument,
        }
    }
}

/// Failures of kernel setup and scheduling, reported to the boot glue.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("address space operation failed: {0}")]
    Map(#[from] MapError),
    #[error(transparent)]
    Sched(#[from] SchedError),
    #[error("kernel core not initialized")]
    Uninitialized,
}

impl KernelError {
    /// The underlying unrecoverable condition, if this is one.
    #[must_use]
    pub const fn fatal(&self) -> Option<FatalError> {
        match self {
            Self::Sched(SchedError::Fatal(f)) => Some(*f),
            _ => None,
        }
    }
}

impl From<FatalError> for KernelError {
    fn from(value: FatalError) -> Self {
        Self::Sched(value.into())
    }
}

use kernel_vmem::MapError;

/// Conditions the scheduler cannot recover from on its own.
///
/// These indicate corrupted kernel state and are reported to the caller
/// rather than papered over.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FatalError {
    #[error("the current process has no record")]
    MissingCurrent,
    #[error("the kernel address space is missing")]
    MissingKernelSpace,
    #[error("the ready queue references a process that is not ready")]
    CorruptedQueue,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum SchedError {
    #[error("process table is full")]
    TooManyProcesses,
    #[error("out of memory")]
    OutOfMemory,
    #[error("no such process")]
    NoSuchProcess,
    #[error("process is in the wrong state for this operation")]
    InvalidState,
    #[error("operation not permitted on the idle process")]
    IdleProcess,
    #[error("mapping failed: {0}")]
    Map(MapError),
    #[error("fatal scheduler error: {0}")]
    Fatal(#[from] FatalError),
}

impl From<MapError> for SchedError {
    fn from(value: MapError) -> Self {
        match value {
            MapError::OutOfMemory => Self::OutOfMemory,
            other => Self::Map(other),
        }
    }
}

/// Reasons a mapping or a copy through the tables can fail.
///
/// Every variant is detected before any table is written, except
/// [`OutOfMemory`](Self::OutOfMemory): tables linked before the allocator ran
/// dry stay in place, empty.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("virtual address outside the address space window")]
    VirtualOutOfRange,
    #[error("physical address beyond the supported range")]
    PhysicalOutOfRange,
    #[error("address not 4 KiB aligned")]
    Unaligned,
    #[error("out of memory")]
    OutOfMemory,
    #[error("access to unmapped memory")]
    NotMapped,
    #[error("page permissions deny the access")]
    AccessDenied,
    #[error("address covered by a huge page")]
    HugePage,
}

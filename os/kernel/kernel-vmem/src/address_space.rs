//! # Address Space (x86-64, PML4-rooted)
//!
//! ## Highlights
//!
//! - [`AddressSpace::new_process`] copies the kernel window into a fresh root.
//! - [`AddressSpace::map`] installs one 4 KiB mapping, creating missing
//!   intermediate tables on the way down.
//! - [`AddressSpace::translate`] walks the tables like the MMU would.
//! - [`AddressSpace::read_user`] / [`AddressSpace::write_user`] copy bytes
//!   through user-accessible mappings, for syscall argument buffers;
//!   `read_with` / `write_with` take the required access explicitly.
//! - [`AddressSpace::destroy`] returns the user-window tables and the root.
//!
//! ## Design
//!
//! - Every argument is validated before the first table is touched.
//! - Intermediate tables are never freed by a mapping call; there is no unmap.
//! - Leaf frames are owned by whoever mapped them, not by the space.
//! - Mutating active mappings requires TLB maintenance; callers reload CR3.

use crate::{FrameAlloc, MapError, MapFlags, PageTableEntry, PhysMapper};
use kernel_info::memory::{
    KERNEL_WINDOW_BASE, KERNEL_WINDOW_FIRST_SLOT, PAGE_SIZE, PHYSICAL_ADDRESS_LIMIT,
    TABLE_ENTRIES, USER_WINDOW_END,
};
use kernel_memory_addresses::{PhysicalAddress, PhysicalFrame, VirtualAddress};
use kernel_registers::cr3::Cr3;
use log::{debug, trace};

/// Number of PML4 slots in the kernel window.
pub const KERNEL_WINDOW_SLOTS: usize = TABLE_ENTRIES - KERNEL_WINDOW_FIRST_SLOT;

/// Which window of the virtual address space a space may map into.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SpaceKind {
    /// The kernel's own space; maps the upper half.
    Kernel,
    /// A process space; maps the lower half and inherits the upper half.
    Process,
}

impl SpaceKind {
    #[must_use]
    pub const fn contains(self, va: VirtualAddress) -> bool {
        match self {
            Self::Kernel => va.as_u64() >= KERNEL_WINDOW_BASE,
            Self::Process => va.as_u64() < USER_WINDOW_END,
        }
    }
}

/// Result of a successful walk.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Translation {
    pub address: PhysicalAddress,
    /// Permission bits of the leaf, `PRESENT` included.
    pub flags: MapFlags,
}

/// Handle to a single, concrete address space.
#[derive(Debug, Eq, PartialEq)]
pub struct AddressSpace {
    root: PhysicalFrame,
    kind: SpaceKind,
}

impl AddressSpace {
    /// Adopt an existing root table, e.g. the one the loader left in CR3.
    #[must_use]
    pub const fn from_root(root: PhysicalFrame, kind: SpaceKind) -> Self {
        Self { root, kind }
    }

    /// Create an empty kernel space.
    ///
    /// # Errors
    /// [`MapError::OutOfMemory`] if no frame is available for the root.
    pub fn new_kernel<M: PhysMapper, A: FrameAlloc>(
        mapper: &mut M,
        alloc: &mut A,
    ) -> Result<Self, MapError> {
        let root = alloc.alloc_4k().ok_or(MapError::OutOfMemory)?;
        mapper.frame_mut(root).zero();
        debug!("created kernel address space, root {root}");
        Ok(Self::from_root(root, SpaceKind::Kernel))
    }

    /// Create a process space whose kernel window is a verbatim copy of
    /// `kernel`'s top-level entries.
    ///
    /// Kernel mappings that need a new PML4 slot after this call are not
    /// seen by the process.
    ///
    /// # Errors
    /// [`MapError::OutOfMemory`] if no frame is available for the root.
    pub fn new_process<M: PhysMapper, A: FrameAlloc>(
        kernel: &Self,
        mapper: &mut M,
        alloc: &mut A,
    ) -> Result<Self, MapError> {
        let window = kernel.kernel_window(mapper);
        let root = alloc.alloc_4k().ok_or(MapError::OutOfMemory)?;

        let table = mapper.frame_mut(root);
        table.zero();
        for (slot, entry) in window.into_iter().enumerate() {
            table.set_entry(KERNEL_WINDOW_FIRST_SLOT + slot, entry);
        }

        debug!("created process address space, root {root}");
        Ok(Self::from_root(root, SpaceKind::Process))
    }

    #[inline]
    #[must_use]
    pub const fn root(&self) -> PhysicalFrame {
        self.root
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> SpaceKind {
        self.kind
    }

    /// The CR3 value that activates this space.
    #[inline]
    #[must_use]
    pub const fn cr3(&self) -> Cr3 {
        Cr3::from_root(self.root)
    }

    /// The upper-half entries of the root table.
    #[must_use]
    pub fn kernel_window<M: PhysMapper>(&self, mapper: &M) -> [PageTableEntry; KERNEL_WINDOW_SLOTS] {
        let table = mapper.frame(self.root);
        core::array::from_fn(|slot| table.entry(KERNEL_WINDOW_FIRST_SLOT + slot))
    }

    /// Map **one** 4 KiB page `va → pa` with `flags | PRESENT`.
    ///
    /// Remapping an already mapped page overwrites its leaf.
    ///
    /// # Errors
    /// - [`MapError::Unaligned`] if either address is not 4 KiB aligned.
    /// - [`MapError::VirtualOutOfRange`] if `va` is outside this space's window.
    /// - [`MapError::PhysicalOutOfRange`] if `pa` cannot be encoded in an entry.
    /// - [`MapError::HugePage`] if a huge page already covers `va`.
    /// - [`MapError::OutOfMemory`] if an intermediate table cannot be allocated.
    pub fn map<M: PhysMapper, A: FrameAlloc>(
        &self,
        mapper: &mut M,
        alloc: &mut A,
        va: VirtualAddress,
        pa: PhysicalAddress,
        flags: MapFlags,
    ) -> Result<(), MapError> {
        if !va.is_page_aligned() || !pa.is_page_aligned() {
            return Err(MapError::Unaligned);
        }
        if !self.kind.contains(va) {
            return Err(MapError::VirtualOutOfRange);
        }
        if pa.as_u64() >= PHYSICAL_ADDRESS_LIMIT {
            return Err(MapError::PhysicalOutOfRange);
        }

        let user = va.is_lower_half();
        let [i4, i3, i2, i1] = va.table_indices();

        let mut table = self.root;
        for index in [i4, i3, i2] {
            table = Self::next_table(mapper, alloc, table, index, user)?;
        }

        mapper
            .frame_mut(table)
            .set_entry(i1, PageTableEntry::leaf(pa.frame(), flags));
        trace!("mapped {va} -> {pa} ({flags:?}) in {}", self.root);
        Ok(())
    }

    /// Follow `table[index]`, creating and linking a zeroed table if absent.
    fn next_table<M: PhysMapper, A: FrameAlloc>(
        mapper: &mut M,
        alloc: &mut A,
        table: PhysicalFrame,
        index: usize,
        user: bool,
    ) -> Result<PhysicalFrame, MapError> {
        let entry = mapper.frame(table).entry(index);
        if entry.huge() {
            return Err(MapError::HugePage);
        }
        if let Some(next) = entry.frame() {
            return Ok(next);
        }

        let next = alloc.alloc_4k().ok_or(MapError::OutOfMemory)?;
        mapper.frame_mut(next).zero();
        mapper
            .frame_mut(table)
            .set_entry(index, PageTableEntry::table(next, user));
        trace!("linked table {next} at {table}[{index}]");
        Ok(next)
    }

    /// Translate `va` to its physical address if mapped.
    ///
    /// Huge-page leaves (only ever inherited) are resolved with their
    /// in-page offset.
    #[must_use]
    pub fn translate<M: PhysMapper>(&self, mapper: &M, va: VirtualAddress) -> Option<Translation> {
        const LEVEL_SPAN: [u64; 3] = [1 << 39, 1 << 30, 1 << 21];

        let indices = va.table_indices();
        let mut table = self.root;
        for (level, &index) in indices[..3].iter().enumerate() {
            let entry = mapper.frame(table).entry(index);
            let next = entry.frame()?;
            if entry.huge() && level > 0 {
                let offset = va.as_u64() & (LEVEL_SPAN[level] - 1);
                return Some(Translation {
                    address: PhysicalAddress::new(next.base().as_u64() + offset),
                    flags: entry.map_flags(),
                });
            }
            table = next;
        }

        let leaf = mapper.frame(table).entry(indices[3]);
        let frame = leaf.frame()?;
        Some(Translation {
            address: frame.join(va.page_offset()),
            flags: leaf.map_flags(),
        })
    }

    /// Copy `buf.len()` bytes starting at user address `va` into `buf`.
    ///
    /// # Errors
    /// [`MapError::VirtualOutOfRange`] if the range leaves the user window,
    /// [`MapError::NotMapped`] or [`MapError::AccessDenied`] if any touched
    /// page is absent or not user accessible. Nothing is copied on error.
    pub fn read_user<M: PhysMapper>(
        &self,
        mapper: &M,
        va: VirtualAddress,
        buf: &mut [u8],
    ) -> Result<(), MapError> {
        self.read_with(mapper, va, buf, MapFlags::USER)
    }

    /// Copy `buf.len()` bytes starting at lower-half address `va` into `buf`,
    /// requiring `access` on every touched page.
    ///
    /// With an empty `access` any present mapping qualifies, which is what
    /// kernel-privileged processes get.
    ///
    /// # Errors
    /// As [`read_user`](Self::read_user), with [`MapError::AccessDenied`]
    /// for pages lacking `access`.
    pub fn read_with<M: PhysMapper>(
        &self,
        mapper: &M,
        va: VirtualAddress,
        buf: &mut [u8],
        access: MapFlags,
    ) -> Result<(), MapError> {
        self.check_user_range(mapper, va, buf.len(), access)?;

        let mut copied = 0;
        while copied < buf.len() {
            let at = VirtualAddress::new(va.as_u64() + copied as u64);
            let (frame, offset, n) = self.user_chunk(mapper, at, buf.len() - copied)?;
            buf[copied..copied + n].copy_from_slice(&mapper.frame(frame).bytes()[offset..offset + n]);
            copied += n;
        }
        Ok(())
    }

    /// Copy `bytes` to user address `va`.
    ///
    /// # Errors
    /// As [`read_user`](Self::read_user); every touched page must also be
    /// writable. Nothing is written on error.
    pub fn write_user<M: PhysMapper>(
        &self,
        mapper: &mut M,
        va: VirtualAddress,
        bytes: &[u8],
    ) -> Result<(), MapError> {
        self.write_with(mapper, va, bytes, MapFlags::USER)
    }

    /// Copy `bytes` to lower-half address `va`, requiring `access` plus
    /// [`MapFlags::WRITABLE`] on every touched page.
    ///
    /// # Errors
    /// As [`write_user`](Self::write_user).
    pub fn write_with<M: PhysMapper>(
        &self,
        mapper: &mut M,
        va: VirtualAddress,
        bytes: &[u8],
        access: MapFlags,
    ) -> Result<(), MapError> {
        self.check_user_range(mapper, va, bytes.len(), access | MapFlags::WRITABLE)?;

        let mut copied = 0;
        while copied < bytes.len() {
            let at = VirtualAddress::new(va.as_u64() + copied as u64);
            let (frame, offset, n) = self.user_chunk(mapper, at, bytes.len() - copied)?;
            mapper.frame_mut(frame).bytes_mut()[offset..offset + n]
                .copy_from_slice(&bytes[copied..copied + n]);
            copied += n;
        }
        Ok(())
    }

    /// Verify every page of `[va, va + len)` lies in the lower half and is
    /// mapped with `required`.
    fn check_user_range<M: PhysMapper>(
        &self,
        mapper: &M,
        va: VirtualAddress,
        len: usize,
        required: MapFlags,
    ) -> Result<(), MapError> {
        if len == 0 {
            return Ok(());
        }
        let end = va
            .checked_add(len as u64 - 1)
            .ok_or(MapError::VirtualOutOfRange)?;
        if !va.is_lower_half() || !end.is_lower_half() {
            return Err(MapError::VirtualOutOfRange);
        }

        let mut page = va.page_base();
        while page <= end {
            let t = self.translate(mapper, page).ok_or(MapError::NotMapped)?;
            if !t.flags.contains(required) {
                return Err(MapError::AccessDenied);
            }
            page = match page.next_page() {
                Some(next) => next,
                None => break,
            };
        }
        Ok(())
    }

    /// Frame, in-frame offset and byte count for the next copy step at `va`.
    fn user_chunk<M: PhysMapper>(
        &self,
        mapper: &M,
        va: VirtualAddress,
        remaining: usize,
    ) -> Result<(PhysicalFrame, usize, usize), MapError> {
        let t = self.translate(mapper, va).ok_or(MapError::NotMapped)?;
        #[allow(clippy::cast_possible_truncation)]
        let offset = va.page_offset() as usize;
        let n = remaining.min(PAGE_SIZE as usize - offset);
        Ok((t.address.frame(), offset, n))
    }

    /// Tear the space down: every user-window table, then the root.
    ///
    /// Frames mapped by leaf entries are not freed; their owner does that.
    /// The kernel window is shared and left untouched.
    pub fn destroy<M: PhysMapper, A: FrameAlloc>(self, mapper: &M, alloc: &mut A) {
        let mut freed = 0usize;
        for slot in 0..KERNEL_WINDOW_FIRST_SLOT {
            if let Some(pdpt) = mapper.frame(self.root).entry(slot).frame() {
                freed += Self::free_tables(mapper, alloc, pdpt, 2);
            }
        }
        alloc.free_4k(self.root);
        debug!("destroyed address space {} ({} tables)", self.root, freed + 1);
    }

    /// Free `table` and, for `depth > 0`, every table below it.
    fn free_tables<M: PhysMapper, A: FrameAlloc>(
        mapper: &M,
        alloc: &mut A,
        table: PhysicalFrame,
        depth: u8,
    ) -> usize {
        let mut freed = 0;
        if depth > 0 {
            for index in 0..TABLE_ENTRIES {
                let entry = mapper.frame(table).entry(index);
                if entry.huge() {
                    continue;
                }
                if let Some(next) = entry.frame() {
                    freed += Self::free_tables(mapper, alloc, next, depth - 1);
                }
            }
        }
        alloc.free_4k(table);
        freed + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameArena;
    use crate::test_support::BumpAlloc;

    fn setup() -> (FrameArena, BumpAlloc, AddressSpace) {
        let mut phys = FrameArena::new();
        let mut alloc = BumpAlloc::new(0x100, 64);
        let kernel = AddressSpace::new_kernel(&mut phys, &mut alloc).unwrap();
        (phys, alloc, kernel)
    }

    #[test]
    fn map_then_translate_returns_frame_and_flags() {
        let (mut phys, mut alloc, kernel) = setup();
        let space = AddressSpace::new_process(&kernel, &mut phys, &mut alloc).unwrap();

        let va = VirtualAddress::new(0x0040_0000);
        let pa = PhysicalAddress::new(0x0030_0000);
        space
            .map(&mut phys, &mut alloc, va, pa, MapFlags::WRITABLE | MapFlags::USER)
            .unwrap();

        let t = space
            .translate(&phys, VirtualAddress::new(0x0040_0123))
            .unwrap();
        assert_eq!(t.address, PhysicalAddress::new(0x0030_0123));
        assert_eq!(t.flags, MapFlags::PRESENT | MapFlags::WRITABLE | MapFlags::USER);
    }

    #[test]
    fn map_walk_creates_three_user_tables() {
        let (mut phys, mut alloc, kernel) = setup();
        let space = AddressSpace::new_process(&kernel, &mut phys, &mut alloc).unwrap();
        let before = alloc.handed_out();

        let va = VirtualAddress::new(0x0000_1234_5678_9000);
        space
            .map(&mut phys, &mut alloc, va, PhysicalAddress::new(0x5000), MapFlags::empty())
            .unwrap();
        assert_eq!(alloc.handed_out() - before, 3);

        let [i4, ..] = va.table_indices();
        let e4 = phys.frame(space.root()).entry(i4);
        assert!(e4.present() && e4.writable() && e4.user());

        // A second page in the same PT needs no new tables.
        space
            .map(
                &mut phys,
                &mut alloc,
                VirtualAddress::new(0x0000_1234_5678_a000),
                PhysicalAddress::new(0x6000),
                MapFlags::empty(),
            )
            .unwrap();
        assert_eq!(alloc.handed_out() - before, 3);
    }

    #[test]
    fn invalid_arguments_leave_tables_untouched() {
        let (mut phys, mut alloc, kernel) = setup();
        let space = AddressSpace::new_process(&kernel, &mut phys, &mut alloc).unwrap();
        let before = alloc.handed_out();
        let ok_pa = PhysicalAddress::new(0x1000);

        let cases = [
            (VirtualAddress::new(0x1001), ok_pa, MapError::Unaligned),
            (VirtualAddress::new(0x1000), PhysicalAddress::new(0x1800), MapError::Unaligned),
            (VirtualAddress::new(KERNEL_WINDOW_BASE), ok_pa, MapError::VirtualOutOfRange),
            (
                VirtualAddress::new(0x1000),
                PhysicalAddress::new(PHYSICAL_ADDRESS_LIMIT),
                MapError::PhysicalOutOfRange,
            ),
        ];
        for (va, pa, expected) in cases {
            assert_eq!(
                space.map(&mut phys, &mut alloc, va, pa, MapFlags::WRITABLE),
                Err(expected)
            );
        }
        assert_eq!(alloc.handed_out(), before);
        assert!((0..KERNEL_WINDOW_FIRST_SLOT).all(|i| !phys.frame(space.root()).entry(i).present()));
    }

    #[test]
    fn kernel_space_rejects_user_addresses() {
        let (mut phys, mut alloc, kernel) = setup();
        assert_eq!(
            kernel.map(
                &mut phys,
                &mut alloc,
                VirtualAddress::new(0x1000),
                PhysicalAddress::new(0x1000),
                MapFlags::WRITABLE
            ),
            Err(MapError::VirtualOutOfRange)
        );
    }

    #[test]
    fn process_spaces_inherit_the_kernel_window() {
        let (mut phys, mut alloc, kernel) = setup();
        kernel
            .map(
                &mut phys,
                &mut alloc,
                VirtualAddress::new(0xffff_ffff_8000_0000),
                PhysicalAddress::new(0x0020_0000),
                MapFlags::WRITABLE,
            )
            .unwrap();

        let space = AddressSpace::new_process(&kernel, &mut phys, &mut alloc).unwrap();
        assert_eq!(space.kernel_window(&phys), kernel.kernel_window(&phys));
        assert_eq!(
            space
                .translate(&phys, VirtualAddress::new(0xffff_ffff_8000_0010))
                .map(|t| t.address),
            Some(PhysicalAddress::new(0x0020_0010))
        );

        space
            .map(
                &mut phys,
                &mut alloc,
                VirtualAddress::new(0x7fff_ffff_f000),
                PhysicalAddress::new(0x9000),
                MapFlags::USER,
            )
            .unwrap();
        assert_eq!(space.kernel_window(&phys), kernel.kernel_window(&phys));
    }

    #[test]
    fn out_of_memory_midway_keeps_linked_tables() {
        let mut phys = FrameArena::new();
        let mut alloc = BumpAlloc::new(0x100, 3);
        let kernel = AddressSpace::new_kernel(&mut phys, &mut alloc).unwrap();
        let space = AddressSpace::new_process(&kernel, &mut phys, &mut alloc).unwrap();

        let va = VirtualAddress::new(0x0040_0000);
        assert_eq!(
            space.map(&mut phys, &mut alloc, va, PhysicalAddress::new(0x1000), MapFlags::USER),
            Err(MapError::OutOfMemory)
        );
        assert!(space.translate(&phys, va).is_none());
        assert!(phys.frame(space.root()).entry(0).present());
    }

    #[test]
    fn translate_resolves_inherited_huge_pages() {
        let (mut phys, mut alloc, kernel) = setup();
        let va = VirtualAddress::new(0xffff_8000_0020_0000);
        let [i4, i3, i2, _] = va.table_indices();

        let pdpt = alloc.alloc_4k().unwrap();
        let pd = alloc.alloc_4k().unwrap();
        phys.frame_mut(kernel.root()).set_entry(i4, PageTableEntry::table(pdpt, false));
        phys.frame_mut(pdpt).set_entry(i3, PageTableEntry::table(pd, false));
        let huge = PageTableEntry::leaf(PhysicalFrame::from_number(0x400), MapFlags::WRITABLE)
            .with_huge(true);
        phys.frame_mut(pd).set_entry(i2, huge);

        let t = kernel
            .translate(&phys, VirtualAddress::new(0xffff_8000_0021_2345))
            .unwrap();
        assert_eq!(t.address, PhysicalAddress::new(0x0041_2345));
        assert_eq!(
            kernel.map(
                &mut phys,
                &mut alloc,
                va,
                PhysicalAddress::new(0x1000),
                MapFlags::WRITABLE
            ),
            Err(MapError::HugePage)
        );
    }

    #[test]
    fn user_copies_cross_page_boundaries() {
        let (mut phys, mut alloc, kernel) = setup();
        let space = AddressSpace::new_process(&kernel, &mut phys, &mut alloc).unwrap();
        let rw = MapFlags::USER | MapFlags::WRITABLE;
        space
            .map(&mut phys, &mut alloc, VirtualAddress::new(0x1000), PhysicalAddress::new(0x8000), rw)
            .unwrap();
        space
            .map(&mut phys, &mut alloc, VirtualAddress::new(0x2000), PhysicalAddress::new(0x3000), rw)
            .unwrap();

        let va = VirtualAddress::new(0x1ffc);
        space.write_user(&mut phys, va, b"abcdefgh").unwrap();
        assert_eq!(&phys.frame(PhysicalFrame::from_number(8)).bytes()[0xffc..], b"abcd");
        assert_eq!(&phys.frame(PhysicalFrame::from_number(3)).bytes()[..4], b"efgh");

        let mut out = [0u8; 8];
        space.read_user(&phys, va, &mut out).unwrap();
        assert_eq!(&out, b"abcdefgh");
    }

    #[test]
    fn user_copies_check_permissions() {
        let (mut phys, mut alloc, kernel) = setup();
        let space = AddressSpace::new_process(&kernel, &mut phys, &mut alloc).unwrap();
        space
            .map(&mut phys, &mut alloc, VirtualAddress::new(0x1000), PhysicalAddress::new(0x8000), MapFlags::USER)
            .unwrap();
        space
            .map(&mut phys, &mut alloc, VirtualAddress::new(0x2000), PhysicalAddress::new(0x9000), MapFlags::WRITABLE)
            .unwrap();

        let mut buf = [0u8; 4];
        assert!(space.read_user(&phys, VirtualAddress::new(0x1000), &mut buf).is_ok());
        assert_eq!(
            space.write_user(&mut phys, VirtualAddress::new(0x1000), &buf),
            Err(MapError::AccessDenied)
        );
        assert_eq!(
            space.read_user(&phys, VirtualAddress::new(0x2000), &mut buf),
            Err(MapError::AccessDenied)
        );
        assert_eq!(
            space.read_user(&phys, VirtualAddress::new(0x5000), &mut buf),
            Err(MapError::NotMapped)
        );
        assert_eq!(
            space.read_user(&phys, VirtualAddress::new(KERNEL_WINDOW_BASE), &mut buf),
            Err(MapError::VirtualOutOfRange)
        );
    }

    #[test]
    fn supervisor_copies_need_only_presence() {
        let (mut phys, mut alloc, kernel) = setup();
        let space = AddressSpace::new_process(&kernel, &mut phys, &mut alloc).unwrap();
        space
            .map(&mut phys, &mut alloc, VirtualAddress::new(0x1000), PhysicalAddress::new(0x8000), MapFlags::WRITABLE)
            .unwrap();
        space
            .map(&mut phys, &mut alloc, VirtualAddress::new(0x2000), PhysicalAddress::new(0x9000), MapFlags::empty())
            .unwrap();

        let va = VirtualAddress::new(0x1000);
        space.write_with(&mut phys, va, b"ring0", MapFlags::empty()).unwrap();
        let mut out = [0u8; 5];
        space.read_with(&phys, va, &mut out, MapFlags::empty()).unwrap();
        assert_eq!(&out, b"ring0");

        assert!(space.read_with(&phys, VirtualAddress::new(0x2000), &mut out, MapFlags::empty()).is_ok());
        assert_eq!(
            space.write_with(&mut phys, VirtualAddress::new(0x2000), &out, MapFlags::empty()),
            Err(MapError::AccessDenied)
        );
        assert_eq!(
            space.read_with(&phys, VirtualAddress::new(KERNEL_WINDOW_BASE), &mut out, MapFlags::empty()),
            Err(MapError::VirtualOutOfRange)
        );
    }

    #[test]
    fn destroy_frees_user_tables_and_root_only() {
        let (mut phys, mut alloc, kernel) = setup();
        kernel
            .map(
                &mut phys,
                &mut alloc,
                VirtualAddress::new(0xffff_ffff_8000_0000),
                PhysicalAddress::new(0x0020_0000),
                MapFlags::WRITABLE,
            )
            .unwrap();
        let space = AddressSpace::new_process(&kernel, &mut phys, &mut alloc).unwrap();
        let root = space.root();
        space
            .map(&mut phys, &mut alloc, VirtualAddress::new(0x1000), PhysicalAddress::new(0x8000), MapFlags::USER)
            .unwrap();
        space
            .map(
                &mut phys,
                &mut alloc,
                VirtualAddress::new(0x0000_4000_0000_0000),
                PhysicalAddress::new(0x9000),
                MapFlags::USER,
            )
            .unwrap();

        space.destroy(&phys, &mut alloc);
        // 2 × (PDPT, PD, PT) plus the root.
        assert_eq!(alloc.freed.len(), 7);
        assert_eq!(alloc.freed.last(), Some(&root));
        assert!(!alloc.freed.contains(&PhysicalFrame::from_number(8)));
        assert!(!alloc.freed.contains(&kernel.root()));
    }
}

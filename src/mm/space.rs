//! User Address Spaces
//!
//! A page-granular model of a process address space: the operations the
//! syscall layer relies on (range copy, clear, three-way merge and
//! permission changes) plus the byte-level accessors used by user copies.
//!
//! # Design
//! - Pages are kept in a `BTreeMap` keyed by page-aligned virtual address
//! - Frames are reference counted; copying a range shares frames and the
//!   first write through either mapping clones the frame (copy-on-write)
//! - Range operations work on an [`Extent`], a detached copy of a range,
//!   so two address spaces never need to be borrowed at once
//!
//! # Security Properties
//! - Reads need `Perm::READ`, writes need `Perm::WRITE`
//! - An access violation is reported as a page [`Fault`] carrying x86
//!   error-code bits, never as a panic

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;

use bitflags::bitflags;
use log::warn;
use spin::Lazy;

use super::address::{is_page_multiple, VirtAddr, PAGE_SIZE};
use crate::trap::{pfe, Fault};

bitflags! {
    /// User access permissions on a mapped page.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Perm: u32 {
        /// User code may read the page.
        const READ = 1 << 0;
        /// User code may write the page.
        const WRITE = 1 << 1;
        /// Read and write.
        const RW = Self::READ.bits() | Self::WRITE.bits();
    }
}

/// Backing storage for one page.
pub type Frame = [u8; PAGE_SIZE];

/// Frame behind every page that has been granted permissions but never
/// written. Writers get a private copy through `Arc::make_mut`.
static ZERO_FRAME: Lazy<Arc<Frame>> = Lazy::new(|| Arc::new([0; PAGE_SIZE]));

/// A mapped page: a shared frame plus its user permissions.
#[derive(Clone)]
struct Page {
    frame: Arc<Frame>,
    perm: Perm,
}

impl Page {
    fn zeroed(perm: Perm) -> Self {
        Self {
            frame: Arc::clone(&*ZERO_FRAME),
            perm,
        }
    }

    /// Two mappings are equivalent when a merge has nothing to carry over.
    fn same(a: Option<&Page>, b: Option<&Page>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.perm == b.perm && (Arc::ptr_eq(&a.frame, &b.frame) || a.frame == b.frame)
            }
            _ => false,
        }
    }
}

/// Error type for address space operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingError {
    /// No memory left for new pages.
    OutOfMemory,
    /// The address or size is not page aligned.
    MisalignedAddress,
}

impl core::fmt::Display for MappingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of memory for page mappings"),
            Self::MisalignedAddress => write!(f, "address not properly aligned"),
        }
    }
}

/// A detached copy of a page-aligned range, keyed by offset into the range.
#[derive(Clone, Default)]
pub struct Extent {
    size: usize,
    pages: BTreeMap<usize, Page>,
}

impl Extent {
    /// Size of the range this extent was taken from.
    pub fn size(&self) -> usize {
        self.size
    }

    fn page(&self, offset: usize) -> Option<&Page> {
        self.pages.get(&offset)
    }
}

/// A process address space.
pub struct AddressSpace {
    pages: BTreeMap<usize, Page>,
    max_pages: usize,
}

impl AddressSpace {
    /// Create an empty address space with no page limit.
    pub const fn new() -> Self {
        Self::with_page_limit(usize::MAX)
    }

    /// Create an empty address space that may hold at most `max_pages`.
    pub const fn with_page_limit(max_pages: usize) -> Self {
        Self {
            pages: BTreeMap::new(),
            max_pages,
        }
    }

    /// Number of mapped pages.
    pub fn mapped_pages(&self) -> usize {
        self.pages.len()
    }

    /// Permissions of the page containing `va`, or `None` if unmapped.
    pub fn perm(&self, va: VirtAddr) -> Option<Perm> {
        self.pages.get(&va.align_down().as_usize()).map(|p| p.perm)
    }

    /// Read user memory into `buf`, as user code would.
    pub fn read(&self, va: VirtAddr, buf: &mut [u8]) -> Result<(), Fault> {
        let mut done = 0;
        while done < buf.len() {
            let at = va.add(done);
            let off = at.page_offset();
            let n = (PAGE_SIZE - off).min(buf.len() - done);
            match self.pages.get(&at.align_down().as_usize()) {
                Some(page) if page.perm.contains(Perm::READ) => {
                    buf[done..done + n].copy_from_slice(&page.frame[off..off + n]);
                }
                Some(_) => return Err(Fault::page(at, pfe::PRESENT)),
                None => return Err(Fault::page(at, 0)),
            }
            done += n;
        }
        Ok(())
    }

    /// Write `data` to user memory, as user code would.
    pub fn write(&mut self, va: VirtAddr, data: &[u8]) -> Result<(), Fault> {
        let mut done = 0;
        while done < data.len() {
            let at = va.add(done);
            let off = at.page_offset();
            let n = (PAGE_SIZE - off).min(data.len() - done);
            match self.pages.get_mut(&at.align_down().as_usize()) {
                Some(page) if page.perm.contains(Perm::WRITE) => {
                    Arc::make_mut(&mut page.frame)[off..off + n]
                        .copy_from_slice(&data[done..done + n]);
                }
                Some(_) => return Err(Fault::page(at, pfe::PRESENT | pfe::WRITE)),
                None => return Err(Fault::page(at, pfe::WRITE)),
            }
            done += n;
        }
        Ok(())
    }

    /// Capture `[va, va+size)` without modifying this address space.
    pub fn extract(&self, va: VirtAddr, size: usize) -> Extent {
        debug_assert!(va.is_aligned() && is_page_multiple(size));
        let start = va.as_usize();
        let end = start.saturating_add(size);
        let pages = self
            .pages
            .range(start..end)
            .map(|(&addr, page)| (addr - start, page.clone()))
            .collect();
        Extent { size, pages }
    }

    /// Replace `[va, va+extent.size())` with the pages of `extent`.
    ///
    /// Frames are shared with the source until one side writes.
    pub fn copy_range(&mut self, va: VirtAddr, extent: &Extent) {
        self.clear_range(va, extent.size);
        let start = va.as_usize();
        for (&off, page) in &extent.pages {
            self.pages.insert(start + off, page.clone());
        }
    }

    /// Unmap every page in `[va, va+size)`.
    pub fn clear_range(&mut self, va: VirtAddr, size: usize) {
        debug_assert!(va.is_aligned() && is_page_multiple(size));
        let start = va.as_usize();
        let end = start.saturating_add(size);
        self.pages.retain(|&addr, _| addr < start || addr >= end);
    }

    /// Three-way merge of `src` into `[va, va+src.size())`, using
    /// `reference` as the common ancestor.
    ///
    /// Pages unchanged in `src` are skipped. Pages unchanged here take
    /// `src` whole. Pages changed on both sides are merged byte by byte;
    /// a byte changed differently on both sides is a conflict and the
    /// destination page is unmapped.
    pub fn merge_range(&mut self, va: VirtAddr, src: &Extent, reference: &Extent) {
        debug_assert_eq!(src.size, reference.size);
        let start = va.as_usize();
        for off in (0..src.size).step_by(PAGE_SIZE) {
            let s = src.page(off);
            let r = reference.page(off);
            if Page::same(s, r) {
                continue;
            }
            let addr = start + off;
            if Page::same(self.pages.get(&addr), r) {
                match s {
                    Some(page) => {
                        self.pages.insert(addr, page.clone());
                    }
                    None => {
                        self.pages.remove(&addr);
                    }
                }
                continue;
            }
            self.merge_page(addr, s, r);
        }
    }

    fn merge_page(&mut self, addr: usize, src: Option<&Page>, reference: Option<&Page>) {
        let zero: &Frame = &ZERO_FRAME;
        let sbytes: &Frame = src.map_or(zero, |p| &*p.frame);
        let rbytes: &Frame = reference.map_or(zero, |p| &*p.frame);
        let perm = src.map_or(Perm::RW, |p| p.perm);
        let dst = self
            .pages
            .entry(addr)
            .or_insert_with(|| Page::zeroed(perm));

        let changed: Vec<usize> = (0..PAGE_SIZE).filter(|&i| sbytes[i] != rbytes[i]).collect();
        if changed
            .iter()
            .any(|&i| dst.frame[i] != rbytes[i] && dst.frame[i] != sbytes[i])
        {
            warn!("merge conflict at {:#010x}, dropping page", addr);
            self.pages.remove(&addr);
            return;
        }
        let frame = Arc::make_mut(&mut dst.frame);
        for i in changed {
            frame[i] = sbytes[i];
        }
    }

    /// Set user permissions on every page of `[va, va+size)`.
    ///
    /// Unmapped pages are mapped to the shared zero frame when any
    /// permission is granted. Fails without modifying anything if those frames would
    /// exceed the page limit.
    pub fn set_perm(&mut self, va: VirtAddr, size: usize, perm: Perm) -> Result<(), MappingError> {
        if !va.is_aligned() || !is_page_multiple(size) {
            return Err(MappingError::MisalignedAddress);
        }
        let start = va.as_usize();
        let end = start.saturating_add(size);
        if !perm.is_empty() {
            let missing = (start..end)
                .step_by(PAGE_SIZE)
                .filter(|addr| !self.pages.contains_key(addr))
                .count();
            if self.pages.len().saturating_add(missing) > self.max_pages {
                return Err(MappingError::OutOfMemory);
            }
        }
        for addr in (start..end).step_by(PAGE_SIZE) {
            match self.pages.get_mut(&addr) {
                Some(page) => page.perm = perm,
                None if !perm.is_empty() => {
                    self.pages.insert(addr, Page::zeroed(perm));
                }
                None => {}
            }
        }
        Ok(())
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

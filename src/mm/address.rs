//! User Virtual Address Types
//!
//! Type-safe wrapper for user virtual addresses and the constants that
//! describe the user address window.
//!
//! # Security Properties
//! - The user window is a half-open range `[USER_LO, USER_HI)`
//! - Range arithmetic never wraps: callers compare sizes against the
//!   remaining window instead of computing `va + size`

use core::fmt;

/// Page size (4 KiB)
pub const PAGE_SIZE: usize = 4096;
/// Page size mask
pub const PAGE_MASK: usize = PAGE_SIZE - 1;

/// Lowest user-accessible virtual address.
pub const USER_LO: usize = 0x4000_0000;
/// One past the highest user-accessible virtual address.
/// Everything at or above belongs to the kernel.
pub const USER_HI: usize = 0xF000_0000;

/// A user virtual address.
///
/// Unlike a raw `usize`, a `VirtAddr` can only be dereferenced through
/// an [`AddressSpace`](super::space::AddressSpace).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct VirtAddr(usize);

impl VirtAddr {
    /// Create a new virtual address.
    #[inline]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Check if the address is page-aligned.
    #[inline]
    pub const fn is_aligned(self) -> bool {
        self.0 & PAGE_MASK == 0
    }

    /// Align the address down to the nearest page boundary.
    #[inline]
    pub const fn align_down(self) -> Self {
        Self(self.0 & !PAGE_MASK)
    }

    /// Get the page offset (lowest 12 bits).
    #[inline]
    pub const fn page_offset(self) -> usize {
        self.0 & PAGE_MASK
    }

    /// Add an offset to this address.
    #[inline]
    pub const fn add(self, offset: usize) -> Self {
        Self(self.0.wrapping_add(offset))
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr({:#010x})", self.0)
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Check that a size is a whole number of pages.
#[inline]
pub const fn is_page_multiple(size: usize) -> bool {
    size & PAGE_MASK == 0
}

//! System Call Input Validation
//!
//! Address checks for syscall arguments. A validated address is wrapped
//! in a type that can only be built by passing its check, so handlers
//! cannot reach user memory with an unchecked value.
//!
//! # Security Principles
//! - Validate every user address before use
//! - Fail-secure: arithmetic that could wrap rejects the input
//! - Byte ranges for kernel copies and page regions for memory operations
//!   follow different rules and have different types

use super::command::{Args, GetMemOp, GetRequest, PutMemOp, PutRequest};
use crate::mm::address::{VirtAddr, PAGE_MASK, USER_HI, USER_LO};
use crate::mm::space::Perm;

/// Start of a byte range inside the user window, valid for a kernel copy
/// of the length it was checked with.
///
/// # Guarantees
/// - `USER_LO <= start < USER_HI`
/// - `len < USER_HI - start`, so the end cannot wrap or leave the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRange {
    start: VirtAddr,
}

impl UserRange {
    /// Check a copy target. A failed check is reported as a page fault.
    pub fn new(uva: u32, len: usize) -> Option<Self> {
        let start = uva as usize;
        if start < USER_LO || start >= USER_HI || len >= USER_HI - start {
            return None;
        }
        Some(Self {
            start: VirtAddr::new(start),
        })
    }

    pub fn start(&self) -> VirtAddr {
        self.start
    }
}

/// A page-aligned region inside the user window, valid for a memory
/// operation or a permission change.
///
/// # Guarantees
/// - start and size are page multiples
/// - `USER_LO <= start <= USER_HI` and `size <= USER_HI - start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    start: VirtAddr,
    size: usize,
}

impl Region {
    /// Check a memory operand. A failed check is a general protection fault.
    pub fn new(va: u32, size: u32) -> Option<Self> {
        let (start, size) = (va as usize, size as usize);
        if start & PAGE_MASK != 0 || size & PAGE_MASK != 0 {
            return None;
        }
        if start < USER_LO || start > USER_HI || size > USER_HI - start {
            return None;
        }
        Some(Self {
            start: VirtAddr::new(start),
            size,
        })
    }

    /// The whole user window.
    pub const fn user_window() -> Self {
        Self {
            start: VirtAddr::new(USER_LO),
            size: USER_HI - USER_LO,
        }
    }

    pub fn start(&self) -> VirtAddr {
        self.start
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Memory operation of a PUT with its checked regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutTransfer {
    None,
    /// Remove the child's destination pages.
    Zero(Region),
    /// Copy caller source to child destination.
    Copy { src: Region, dst: Region },
}

/// Memory operation of a GET with its checked regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetTransfer {
    None,
    /// Remove the caller's destination pages.
    Zero(Region),
    /// Copy child source to caller destination.
    Copy { src: Region, dst: Region },
    /// Merge child source changes into the caller destination.
    Merge { src: Region, dst: Region },
}

/// A decoded request whose memory operands can be checked.
pub trait MemRequest {
    /// Checked form of the request's memory operation.
    type Transfer;

    /// Check the regions the memory operation uses.
    fn transfer(&self, args: &Args) -> Option<Self::Transfer>;

    /// Permissions to set on the destination, if any.
    fn perm(&self) -> Option<Perm>;
}

impl MemRequest for PutRequest {
    type Transfer = PutTransfer;

    fn transfer(&self, args: &Args) -> Option<PutTransfer> {
        let region = |va| Region::new(va, args.size);
        Some(match self.memop {
            PutMemOp::None => PutTransfer::None,
            PutMemOp::Zero => PutTransfer::Zero(region(args.dst)?),
            PutMemOp::Copy => PutTransfer::Copy {
                src: region(args.src)?,
                dst: region(args.dst)?,
            },
        })
    }

    fn perm(&self) -> Option<Perm> {
        self.perm
    }
}

impl MemRequest for GetRequest {
    type Transfer = GetTransfer;

    fn transfer(&self, args: &Args) -> Option<GetTransfer> {
        let region = |va| Region::new(va, args.size);
        Some(match self.memop {
            GetMemOp::None => GetTransfer::None,
            GetMemOp::Zero => GetTransfer::Zero(region(args.dst)?),
            GetMemOp::Copy => GetTransfer::Copy {
                src: region(args.src)?,
                dst: region(args.dst)?,
            },
            GetMemOp::Merge => GetTransfer::Merge {
                src: region(args.src)?,
                dst: region(args.dst)?,
            },
        })
    }

    fn perm(&self) -> Option<Perm> {
        self.perm
    }
}

/// Every memory operand of a PUT or GET, checked up front so that a
/// rejected request has no partial effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operands<T> {
    pub transfer: T,
    pub perm: Option<(Region, Perm)>,
}

impl<T> Operands<T> {
    /// `None` if any region the request uses is misaligned or outside the
    /// user window. All regions share the size in `ecx`.
    pub fn check<R: MemRequest<Transfer = T>>(req: &R, args: &Args) -> Option<Self> {
        let transfer = req.transfer(args)?;
        let perm = match req.perm() {
            Some(perm) => Some((Region::new(args.dst, args.size)?, perm)),
            None => None,
        };
        Some(Self { transfer, perm })
    }
}

//! Command Word Decoding
//!
//! The syscall command word in `eax` packs the call type, the optional
//! steps of PUT and GET, and their arguments. Decoding turns it into a
//! [`PutRequest`] or [`GetRequest`] so handlers never look at raw bits.
//! Flag combinations that have no meaning for the call are rejected, and
//! the request types cannot represent them.

use bitflags::bitflags;

use crate::mm::space::Perm;
use crate::trap::{ProcState, TrapFrame};

bitflags! {
    /// Bits of the syscall command word.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Cmd: u32 {
        /// Call type field.
        const TYPE = 0x0000_000F;
        /// Start the child after PUT.
        const START = 0x0000_0010;
        /// Set permissions on the destination range.
        const PERM = 0x0000_0100;
        /// Permission: readable.
        const READ = 0x0000_0200;
        /// Permission: writable.
        const WRITE = 0x0000_0400;
        /// Permission: readable and writable.
        const RW = Self::READ.bits() | Self::WRITE.bits();
        /// Transfer the integer register image.
        const REGS = 0x0000_1000;
        /// Include the FPU image in the register transfer.
        const FPU = 0x0000_2000;
        /// Memory operation field.
        const MEMOP = 0x0003_0000;
        /// Memory operation: remove the destination range.
        const ZERO = 0x0001_0000;
        /// Memory operation: copy source to destination.
        const COPY = 0x0002_0000;
        /// Memory operation: merge child changes into the caller.
        const MERGE = 0x0003_0000;
        /// Snapshot the child's memory as its merge reference.
        const SNAP = 0x0004_0000;
    }
}

/// Call types.
pub mod types {
    /// Write a string to the console.
    pub const CPUTS: u32 = 0;
    /// Push state into a child.
    pub const PUT: u32 = 1;
    /// Pull state out of a child.
    pub const GET: u32 = 2;
    /// Stop and return to the parent.
    pub const RET: u32 = 3;
}

/// A recognized call type.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Op {
    Cputs,
    Put,
    Get,
    Ret,
}

impl Op {
    /// Extract the call type, `None` for an unassigned type value.
    pub fn from_cmd(cmd: u32) -> Option<Self> {
        match cmd & Cmd::TYPE.bits() {
            types::CPUTS => Some(Self::Cputs),
            types::PUT => Some(Self::Put),
            types::GET => Some(Self::Get),
            types::RET => Some(Self::Ret),
            _ => None,
        }
    }
}

/// Which part of the register image moves.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RegSet {
    /// Trap frame and page fault address.
    Int,
    /// Integer image followed by the FPU image.
    Full,
}

impl RegSet {
    /// Size of the user buffer in bytes.
    pub const fn len(self) -> usize {
        match self {
            Self::Int => ProcState::INT_LEN,
            Self::Full => ProcState::FULL_LEN,
        }
    }
}

/// Memory operation of a PUT. MERGE has no meaning when pushing into a
/// child, so it cannot be expressed here.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PutMemOp {
    None,
    Zero,
    Copy,
}

/// Memory operation of a GET.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GetMemOp {
    None,
    Zero,
    Copy,
    Merge,
}

/// Flag combinations rejected at decode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DecodeError {
    /// MERGE only makes sense when pulling from a child.
    MergeOnPut,
    /// SNAP only applies to a child's memory, on PUT.
    SnapOnGet,
    /// Only PUT starts a child.
    StartOnGet,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MergeOnPut => write!(f, "MERGE on PUT"),
            Self::SnapOnGet => write!(f, "SNAP on GET"),
            Self::StartOnGet => write!(f, "START on GET"),
        }
    }
}

fn decode_regs(cmd: Cmd) -> Option<RegSet> {
    match (cmd.contains(Cmd::REGS), cmd.contains(Cmd::FPU)) {
        (false, _) => None,
        (true, false) => Some(RegSet::Int),
        (true, true) => Some(RegSet::Full),
    }
}

fn decode_memop(cmd: Cmd) -> GetMemOp {
    match (cmd & Cmd::MEMOP).bits() {
        0 => GetMemOp::None,
        x if x == Cmd::ZERO.bits() => GetMemOp::Zero,
        x if x == Cmd::COPY.bits() => GetMemOp::Copy,
        _ => GetMemOp::Merge,
    }
}

/// Permission flags apply only when `PERM` is set.
fn decode_perm(cmd: Cmd) -> Option<Perm> {
    cmd.contains(Cmd::PERM).then(|| {
        let mut perm = Perm::empty();
        perm.set(Perm::READ, cmd.contains(Cmd::READ));
        perm.set(Perm::WRITE, cmd.contains(Cmd::WRITE));
        perm
    })
}

/// Decoded steps of a PUT.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PutRequest {
    pub regs: Option<RegSet>,
    pub memop: PutMemOp,
    pub perm: Option<Perm>,
    pub snap: bool,
    pub start: bool,
}

impl PutRequest {
    pub fn decode(cmd: u32) -> Result<Self, DecodeError> {
        let cmd = Cmd::from_bits_retain(cmd);
        let memop = match decode_memop(cmd) {
            GetMemOp::None => PutMemOp::None,
            GetMemOp::Zero => PutMemOp::Zero,
            GetMemOp::Copy => PutMemOp::Copy,
            GetMemOp::Merge => return Err(DecodeError::MergeOnPut),
        };
        Ok(Self {
            regs: decode_regs(cmd),
            memop,
            perm: decode_perm(cmd),
            snap: cmd.contains(Cmd::SNAP),
            start: cmd.contains(Cmd::START),
        })
    }
}

/// Decoded steps of a GET.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GetRequest {
    pub regs: Option<RegSet>,
    pub memop: GetMemOp,
    pub perm: Option<Perm>,
}

impl GetRequest {
    pub fn decode(cmd: u32) -> Result<Self, DecodeError> {
        let cmd = Cmd::from_bits_retain(cmd);
        if cmd.contains(Cmd::SNAP) {
            return Err(DecodeError::SnapOnGet);
        }
        if cmd.contains(Cmd::START) {
            return Err(DecodeError::StartOnGet);
        }
        Ok(Self {
            regs: decode_regs(cmd),
            memop: decode_memop(cmd),
            perm: decode_perm(cmd),
        })
    }
}

/// Syscall arguments as read from the caller's registers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Args {
    pub cmd: u32,
    pub child: u32,
    pub buf: u32,
    pub src: u32,
    pub dst: u32,
    pub size: u32,
}

impl Args {
    pub fn from_frame(tf: &TrapFrame) -> Self {
        Self {
            cmd: tf.eax,
            child: tf.edx,
            buf: tf.ebx,
            src: tf.esi,
            dst: tf.edi,
            size: tf.ecx,
        }
    }
}

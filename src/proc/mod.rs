//! Process Tree
//!
//! Processes live in an arena indexed by [`ProcId`]. Ownership flows from
//! parent to child through each parent's [`ChildTable`]; the link back to
//! the parent is a plain index.
//!
//! # Reserved Entries
//! - `ProcId::NULL`: the sentinel returned for an empty child slot. It is
//!   always stopped, has zeroed registers and empty address spaces, and is
//!   never modified.
//! - `ProcId::ROOT`: the only process without a parent.

mod children;
mod lifecycle;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use spin::Mutex;

use crate::mm::space::AddressSpace;
use crate::trap::{ProcState, TrapFrame};

pub use children::{ChildSlot, ChildTable, CHILD_SLOTS};
pub use lifecycle::SaveMode;

/// Index of a process in the process table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[repr(transparent)]
pub struct ProcId(u32);

impl ProcId {
    /// The empty-slot sentinel.
    pub const NULL: Self = Self(0);
    /// The root of the process tree.
    pub const ROOT: Self = Self(1);

    /// Get the index value.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for ProcId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "proc{}", self.0)
    }
}

/// Scheduling state of a process.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProcStatus {
    /// Stopped: its parent may inspect and modify it.
    Stop,
    /// Runnable, waiting in the ready queue.
    Ready,
    /// Running on a CPU.
    Run,
    /// Blocked until the given child stops.
    Wait(ProcId),
}

/// Error type for process allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcError {
    /// The process table is full.
    OutOfMemory,
}

impl core::fmt::Display for ProcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "process table exhausted"),
        }
    }
}

/// A process record.
pub struct Process {
    /// Slot number in the parent's child table.
    pub slot: ChildSlot,
    /// Parent process; `None` only for the root and the null process.
    pub parent: Option<ProcId>,
    /// Child table, doubling as this process's lock.
    children: Arc<Mutex<ChildTable>>,
    /// Scheduling state.
    pub state: ProcStatus,
    /// Saved registers, authoritative while not running.
    pub sv: ProcState,
    /// Primary address space.
    pub pdir: AddressSpace,
    /// Reference snapshot used as the merge baseline.
    pub rpdir: AddressSpace,
}

impl Process {
    /// Create a stopped process with empty address spaces.
    pub fn new(slot: ChildSlot, parent: Option<ProcId>, max_pages: usize) -> Self {
        let sv = ProcState {
            tf: TrapFrame::user(),
            ..ProcState::default()
        };
        Self {
            slot,
            parent,
            children: Arc::new(Mutex::new(ChildTable::new())),
            state: ProcStatus::Stop,
            sv,
            pdir: AddressSpace::with_page_limit(max_pages),
            rpdir: AddressSpace::with_page_limit(max_pages),
        }
    }

    /// Handle on this process's lock.
    ///
    /// The handle is independent of the process table, so the guard can
    /// be held while other process records are updated.
    pub fn lock_handle(&self) -> Arc<Mutex<ChildTable>> {
        Arc::clone(&self.children)
    }

    /// Look up a child without holding the lock past the call.
    pub fn child(&self, slot: ChildSlot) -> Option<ProcId> {
        self.children.lock().get(slot)
    }
}

/// The process arena.
pub struct ProcTable {
    procs: Vec<Process>,
}

impl ProcTable {
    /// Create a table holding the null process and a stopped root.
    pub fn new(max_pages: usize) -> Self {
        let mut null = Process::new(ChildSlot::new(0), None, 0);
        null.sv = ProcState::default();
        let root = Process::new(ChildSlot::new(0), None, max_pages);
        Self {
            procs: alloc::vec![null, root],
        }
    }

    /// Number of process records, the null process included.
    pub fn len(&self) -> usize {
        self.procs.len()
    }

    /// Always false: the null process and root exist from creation.
    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    /// Append a process and return its id.
    pub fn push(&mut self, proc: Process) -> ProcId {
        let id = ProcId(self.procs.len() as u32);
        self.procs.push(proc);
        id
    }
}

impl Index<ProcId> for ProcTable {
    type Output = Process;

    #[inline]
    fn index(&self, id: ProcId) -> &Self::Output {
        &self.procs[id.index()]
    }
}

impl IndexMut<ProcId> for ProcTable {
    #[inline]
    fn index_mut(&mut self, id: ProcId) -> &mut Self::Output {
        debug_assert_ne!(id, ProcId::NULL, "the null process is immutable");
        &mut self.procs[id.index()]
    }
}

//! Kernel Object
//!
//! Owns the process table, the CPU state and the console, and exposes the
//! user trap entry that the low-level vector code calls.
//!
//! # Control Transfer
//! Every trap ends in exactly one of three ways (see [`Exit`]). Handlers
//! prove they picked one by returning a [`Divert`], which only the
//! control-transfer primitives in this crate can construct.

use alloc::boxed::Box;
use alloc::collections::VecDeque;

use log::info;

use crate::cpu::Cpu;
use crate::drivers::Console;
use crate::mm::space::AddressSpace;
use crate::proc::{ProcId, ProcTable, Process, SaveMode};
use crate::trap::{TrapFrame, T_SYSCALL};

/// Resource limits. Exceeding either is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of process records, null process and root included.
    pub max_procs: usize,
    /// Maximum mapped pages per address space.
    pub max_pages: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_procs: 1024,
            max_pages: usize::MAX,
        }
    }
}

/// Where control went after a trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Back to the trapping process, past the trapping instruction.
    Resume,
    /// The trapping process blocked until a child stops; its syscall
    /// restarts when it runs again.
    Block,
    /// The trapping process stopped and control went up to its parent.
    Stop,
}

/// Proof that a handler transferred control.
///
/// There is no way to finish a syscall handler without one, and only
/// `trap_return`, `systrap`, `proc_wait` and `proc_ret` create them.
#[must_use]
#[derive(Debug)]
pub struct Divert(Exit);

impl Divert {
    pub(crate) const fn new(exit: Exit) -> Self {
        Self(exit)
    }

    /// Where control went.
    pub fn exit(&self) -> Exit {
        self.0
    }
}

/// Result of a step that may divert control instead of continuing.
pub(crate) type Flow<T> = Result<T, Divert>;

/// A single-CPU kernel instance.
pub struct Kernel {
    pub(crate) procs: ProcTable,
    pub(crate) cpu: Cpu,
    pub(crate) ready: VecDeque<ProcId>,
    pub(crate) console: Box<dyn Console>,
    pub(crate) limits: Limits,
    pub(crate) halted: bool,
}

impl Kernel {
    /// Boot with default limits. The root process starts running.
    pub fn new(console: Box<dyn Console>) -> Self {
        Self::with_limits(console, Limits::default())
    }

    /// Boot with explicit limits.
    pub fn with_limits(console: Box<dyn Console>, limits: Limits) -> Self {
        let mut kernel = Self {
            procs: ProcTable::new(limits.max_pages),
            cpu: Cpu::new(0),
            ready: VecDeque::new(),
            console,
            limits,
            halted: false,
        };
        kernel.proc_ready(ProcId::ROOT);
        kernel.schedule();
        info!("root process running on cpu{}", kernel.cpu.id());
        kernel
    }

    /// Process running on the CPU, if any.
    pub fn current(&self) -> Option<ProcId> {
        self.cpu.proc
    }

    /// Live trap frame of the running process.
    pub fn frame(&self) -> &TrapFrame {
        &self.cpu.tf
    }

    /// Mutable live trap frame, as user code would change its registers.
    pub fn frame_mut(&mut self) -> &mut TrapFrame {
        &mut self.cpu.tf
    }

    /// Look up a process record.
    pub fn process(&self, id: ProcId) -> &Process {
        &self.procs[id]
    }

    /// Primary address space of a process, for loaders and user stores.
    pub fn space_mut(&mut self, id: ProcId) -> &mut AddressSpace {
        &mut self.procs[id].pdir
    }

    /// Processes waiting for the CPU, in run order.
    pub fn ready_queue(&self) -> impl Iterator<Item = ProcId> + '_ {
        self.ready.iter().copied()
    }

    /// True once the root process has returned.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// User-mode trap entry.
    ///
    /// Syscalls go to the dispatcher; anything else, including an
    /// unrecognized syscall type, is reflected to the parent.
    ///
    /// # Panics
    /// Panics if no process is running.
    pub fn trap(&mut self, trapno: u32, err: u32) -> Exit {
        let mut tf = self.cpu.tf;
        tf.trapno = trapno;
        tf.err = err;
        let divert = match trapno {
            T_SYSCALL => match self.syscall(&mut tf) {
                Some(divert) => divert,
                None => self.proc_ret(&mut tf, SaveMode::Trap),
            },
            _ => self.proc_ret(&mut tf, SaveMode::Trap),
        };
        match divert.exit() {
            Exit::Resume => self.cpu.tf = tf,
            Exit::Block | Exit::Stop => self.schedule(),
        }
        divert.exit()
    }

    /// Resume the caller past its syscall instruction.
    pub(crate) fn trap_return(&self, _tf: &TrapFrame) -> Divert {
        Divert::new(Exit::Resume)
    }
}

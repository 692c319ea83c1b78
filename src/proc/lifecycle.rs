//! Process Lifecycle
//!
//! Creation, the ready queue, waiting on a child and the child-to-parent
//! handoff used by RET and by trap reflection.

use log::{debug, info, trace};
use spin::MutexGuard;

use super::{ChildSlot, ChildTable, ProcError, ProcId, ProcStatus, Process};
use crate::kernel::{Divert, Exit, Kernel};
use crate::trap::{TrapFrame, SYSCALL_INSN_LEN};

/// How a trap frame is saved when its process leaves the CPU.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SaveMode {
    /// Hardware trap: `eip` is already where the parent should see it.
    Trap,
    /// Syscall aborted or to be restarted: back `eip` up onto the
    /// syscall instruction.
    Abort,
    /// Syscall completed: `eip` stays past the syscall instruction.
    Complete,
}

impl Kernel {
    /// The process running on this CPU.
    ///
    /// # Panics
    /// Panics if the CPU is idle or the process is not in the run state.
    pub(crate) fn running(&self) -> ProcId {
        let Some(id) = self.cpu.proc else {
            panic!("cpu{}: no process running", self.cpu.id());
        };
        assert_eq!(self.procs[id].state, ProcStatus::Run, "{} not running", id);
        id
    }

    /// Allocate a stopped child record. The caller installs it in the
    /// parent's child table while holding the parent's lock.
    pub(crate) fn proc_alloc(&mut self, parent: ProcId, slot: ChildSlot) -> Result<ProcId, ProcError> {
        if self.procs.len() >= self.limits.max_procs {
            return Err(ProcError::OutOfMemory);
        }
        let id = self
            .procs
            .push(Process::new(slot, Some(parent), self.limits.max_pages));
        debug!("{} created as child {} of {}", id, slot, parent);
        Ok(id)
    }

    /// Make a process runnable.
    pub(crate) fn proc_ready(&mut self, id: ProcId) {
        let proc = &mut self.procs[id];
        debug_assert!(
            !matches!(proc.state, ProcStatus::Ready | ProcStatus::Run),
            "{} already runnable",
            id
        );
        proc.state = ProcStatus::Ready;
        self.ready.push_back(id);
        trace!("{} ready", id);
    }

    /// Save a trap frame into a process's register image.
    pub(crate) fn proc_save(&mut self, id: ProcId, tf: &TrapFrame, mode: SaveMode) {
        let mut saved = *tf;
        if mode == SaveMode::Abort {
            saved.eip = saved.eip.wrapping_sub(SYSCALL_INSN_LEN);
        }
        self.procs[id].sv.tf = saved;
    }

    /// Block the running process until `child` stops.
    ///
    /// Takes the caller's lock so it is released only after the process
    /// is marked waiting. The syscall is rolled back and runs again once
    /// the process is rescheduled.
    pub(crate) fn proc_wait(
        &mut self,
        lock: MutexGuard<'_, ChildTable>,
        child: ProcId,
        tf: &TrapFrame,
    ) -> Divert {
        let p = self.running();
        debug_assert_ne!(self.procs[child].state, ProcStatus::Stop);
        self.procs[p].state = ProcStatus::Wait(child);
        self.proc_save(p, tf, SaveMode::Abort);
        drop(lock);
        debug!("{} waiting for {}", p, child);
        Divert::new(Exit::Block)
    }

    /// Stop the running process and hand control to its parent.
    ///
    /// # Panics
    /// The root has no parent: RET from the root halts the kernel, any
    /// other trap in the root is fatal.
    pub(crate) fn proc_ret(&mut self, tf: &mut TrapFrame, mode: SaveMode) -> Divert {
        let cp = self.running();
        let Some(parent) = self.procs[cp].parent else {
            if mode != SaveMode::Complete {
                panic!(
                    "trap {} err {:#x} in root process at eip {:#010x}",
                    tf.trapno, tf.err, tf.eip
                );
            }
            self.proc_save(cp, tf, mode);
            self.procs[cp].state = ProcStatus::Stop;
            self.halted = true;
            info!("root process returned, halting");
            return Divert::new(Exit::Stop);
        };

        let lock = self.procs[parent].lock_handle();
        let _guard = lock.lock();
        self.procs[cp].state = ProcStatus::Stop;
        self.proc_save(cp, tf, mode);
        trace!("{} stopped (trap {}), parent {}", cp, tf.trapno, parent);
        if self.procs[parent].state == ProcStatus::Wait(cp) {
            self.proc_ready(parent);
        }
        Divert::new(Exit::Stop)
    }

    /// Give the CPU to the next ready process, or leave it idle.
    pub(crate) fn schedule(&mut self) {
        self.cpu.proc = None;
        if self.halted {
            return;
        }
        match self.ready.pop_front() {
            Some(id) => {
                let proc = &mut self.procs[id];
                proc.state = ProcStatus::Run;
                self.cpu.tf = proc.sv.tf;
                self.cpu.proc = Some(id);
                trace!("cpu{}: running {}", self.cpu.id(), id);
            }
            None => debug!("cpu{}: idle", self.cpu.id()),
        }
    }
}

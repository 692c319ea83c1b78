//! Per-CPU State
//!
//! Each processor tracks the process it is running, that process's live
//! user trap frame, and at most one armed recovery token.
//!
//! # Recovery
//! A kernel copy to or from user memory arms a [`Recover`] token before
//! touching user pages and disarms it afterwards. A fault taken while the
//! token is armed is routed to the token's owner instead of the normal
//! kernel fault path, which treats any kernel-mode fault as fatal.

use crate::proc::ProcId;
use crate::trap::{Fault, TrapFrame};

/// An armed recovery: the process whose syscall a copy fault is blamed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recover {
    pub blame: ProcId,
}

/// State owned by one processor.
#[derive(Debug)]
pub struct Cpu {
    id: usize,
    /// Process currently running here, if any.
    pub proc: Option<ProcId>,
    /// Live user trap frame of the running process.
    pub tf: TrapFrame,
    recover: Option<Recover>,
}

impl Cpu {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            proc: None,
            tf: TrapFrame::default(),
            recover: None,
        }
    }

    /// Processor number.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Whether a recovery token is armed.
    pub fn is_armed(&self) -> bool {
        self.recover.is_some()
    }

    /// Arm the one-shot recovery token.
    ///
    /// # Panics
    /// Panics if a token is already armed.
    pub fn arm(&mut self, recover: Recover) {
        assert!(
            self.recover.is_none(),
            "cpu{}: recovery already armed ({:?})",
            self.id,
            self.recover
        );
        self.recover = Some(recover);
    }

    /// Disarm the token after a copy completed without faulting.
    ///
    /// # Panics
    /// Panics if no token is armed.
    pub fn disarm(&mut self) -> Recover {
        match self.recover.take() {
            Some(recover) => recover,
            None => panic!("cpu{}: disarming without an armed recovery", self.id),
        }
    }

    /// Kernel-mode fault entry.
    ///
    /// Consumes the armed token and hands it back so the caller can
    /// reflect the fault. A fault with nothing armed is a kernel bug.
    pub fn fault_entry(&mut self, fault: &Fault) -> Recover {
        match self.recover.take() {
            Some(recover) => recover,
            None => panic!(
                "cpu{}: kernel fault trap {} err {:#x} at {}",
                self.id, fault.trapno, fault.err, fault.addr
            ),
        }
    }
}

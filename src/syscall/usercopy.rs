//! Recoverable User Copies
//!
//! Syscalls move data between kernel buffers and the caller's memory.
//! The address is checked against the user window first; after that,
//! the copy runs with the CPU's recovery token armed, so a fault on a
//! missing or protected page becomes a trap reflected to the caller's
//! parent instead of a kernel crash.
//!
//! # Security Properties
//! - Kernel memory is never reachable: the window check runs before
//!   anything is touched
//! - A faulting copy reports the hardware trap number and error code
//!   against the syscall that caused it

use log::warn;

use super::validate::UserRange;
use crate::cpu::Recover;
use crate::kernel::{Divert, Flow, Kernel};
use crate::proc::SaveMode;
use crate::trap::{Fault, TrapFrame, SYSCALL_INSN_LEN, T_PGFLT};

/// Direction and kernel side of a user copy.
pub(crate) enum UserCopy<'a> {
    /// User memory into the kernel buffer.
    FromUser(&'a mut [u8]),
    /// The kernel buffer out to user memory.
    ToUser(&'a [u8]),
}

impl UserCopy<'_> {
    fn len(&self) -> usize {
        match self {
            Self::FromUser(buf) => buf.len(),
            Self::ToUser(buf) => buf.len(),
        }
    }
}

impl Kernel {
    /// Reflect the running syscall to the parent as trap `trapno`.
    ///
    /// The saved `eip` is rolled back onto the syscall instruction, so the
    /// parent sees the trap where the caller issued it.
    pub(crate) fn systrap(&mut self, tf: &mut TrapFrame, trapno: u32, err: u32) -> Divert {
        warn!(
            "{}: syscall {:#x} at {:#010x} reflected as trap {} err {:#x}",
            self.running(),
            tf.eax,
            tf.eip.wrapping_sub(SYSCALL_INSN_LEN),
            trapno,
            err
        );
        tf.trapno = trapno;
        tf.err = err;
        self.proc_ret(tf, SaveMode::Abort)
    }

    /// Reflect a fault caught during a recoverable copy.
    fn sysrecover(&mut self, tf: &mut TrapFrame, recover: Recover, fault: &Fault) -> Divert {
        assert_eq!(
            Some(recover.blame),
            self.cpu.proc,
            "copy fault blamed on a process that is not running"
        );
        self.systrap(tf, fault.trapno, fault.err)
    }

    /// Check that `[uva, uva+size)` lies inside the user window.
    pub(crate) fn checkva(&mut self, tf: &mut TrapFrame, uva: u32, size: usize) -> Flow<UserRange> {
        match UserRange::new(uva, size) {
            Some(range) => Ok(range),
            None => Err(self.systrap(tf, T_PGFLT, 0)),
        }
    }

    /// Copy between a kernel buffer and the caller's memory at `uva`.
    pub(crate) fn usercopy(&mut self, tf: &mut TrapFrame, copy: UserCopy<'_>, uva: u32) -> Flow<()> {
        let range = self.checkva(tf, uva, copy.len())?;
        let p = self.running();

        self.cpu.arm(Recover { blame: p });
        let space = &mut self.procs[p].pdir;
        let result = match copy {
            UserCopy::FromUser(kbuf) => space.read(range.start(), kbuf),
            UserCopy::ToUser(kbuf) => space.write(range.start(), kbuf),
        };

        match result {
            Ok(()) => {
                self.cpu.disarm();
                Ok(())
            }
            Err(fault) => {
                let recover = self.cpu.fault_entry(&fault);
                Err(self.sysrecover(tf, recover, &fault))
            }
        }
    }
}

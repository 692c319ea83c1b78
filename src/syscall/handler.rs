//! System Call Handlers
//!
//! Dispatches the four process-control calls and implements them.
//!
//! # Security Considerations
//! - Unknown call types are not handled here: they reflect to the parent
//!   like any other trap
//! - Flag combinations and memory regions are rejected before any state
//!   changes, so a refused call has no effect
//! - A child is only inspected or modified while stopped; the caller
//!   waits otherwise
//! - The caller's lock is held only for the child lookup and the stopped
//!   check, never across a user copy or an address-space operation

use log::{debug, trace};

use super::command::{Args, DecodeError, GetRequest, Op, PutRequest};
use super::usercopy::UserCopy;
use super::validate::{GetTransfer, MemRequest, Operands, PutTransfer, Region};
use crate::kernel::{Divert, Flow, Kernel};
use crate::proc::{ChildSlot, ProcId, ProcStatus, SaveMode};
use crate::trap::{ProcState, TrapFrame, T_GPFLT};

/// Bytes CPUTS copies from the caller.
pub const CPUTS_MAX: usize = 256;

impl Kernel {
    /// Dispatch a syscall.
    ///
    /// Returns `None` when the type field names no call; the trap is then
    /// handled like any other.
    pub(crate) fn syscall(&mut self, tf: &mut TrapFrame) -> Option<Divert> {
        let op = Op::from_cmd(tf.eax)?;
        trace!("{}: {:?} cmd {:#x}", self.running(), op, tf.eax);
        let flow = match op {
            Op::Cputs => self.do_cputs(tf),
            Op::Put => self.do_put(tf),
            Op::Get => self.do_get(tf),
            Op::Ret => Ok(self.do_ret(tf)),
        };
        let (Ok(divert) | Err(divert)) = flow;
        Some(divert)
    }

    /// Write up to `CPUTS_MAX` bytes of a NUL-terminated string.
    fn do_cputs(&mut self, tf: &mut TrapFrame) -> Flow<Divert> {
        let uva = tf.ebx;
        let mut buf = [0u8; CPUTS_MAX + 1];
        self.usercopy(tf, UserCopy::FromUser(&mut buf[..CPUTS_MAX]), uva)?;
        let len = buf.iter().position(|&b| b == 0).unwrap_or(CPUTS_MAX);
        self.console.write(&buf[..len]);
        Ok(self.trap_return(tf))
    }

    /// Check every memory operand of a decoded request.
    fn checked<R: MemRequest>(
        &mut self,
        tf: &mut TrapFrame,
        decoded: Result<R, DecodeError>,
        args: &Args,
    ) -> Flow<(R, Operands<R::Transfer>)> {
        let req = match decoded {
            Ok(req) => req,
            Err(e) => {
                debug!("{}: rejected {}", self.running(), e);
                return Err(self.systrap(tf, T_GPFLT, 0));
            }
        };
        match Operands::check(&req, args) {
            Some(ops) => Ok((req, ops)),
            None => Err(self.systrap(tf, T_GPFLT, 0)),
        }
    }

    /// Push registers, memory and permissions into a child, creating it
    /// if the slot is empty, and optionally start it.
    fn do_put(&mut self, tf: &mut TrapFrame) -> Flow<Divert> {
        let args = Args::from_frame(tf);
        let (req, ops) = self.checked(tf, PutRequest::decode(args.cmd), &args)?;
        let p = self.running();
        let slot = ChildSlot::from_reg(args.child);

        let lock = self.procs[p].lock_handle();
        let mut children = lock.lock();
        let c = match children.get_or_try_insert(slot, || self.proc_alloc(p, slot)) {
            Ok(c) => c,
            Err(e) => panic!("{}: no memory for child {}: {}", p, slot, e),
        };
        if self.procs[c].state != ProcStatus::Stop {
            return Err(self.proc_wait(children, c, tf));
        }
        drop(children);

        if let Some(regs) = req.regs {
            let mut img = [0u8; ProcState::FULL_LEN];
            self.usercopy(tf, UserCopy::FromUser(&mut img[..regs.len()]), args.buf)?;
            let sv = &mut self.procs[c].sv;
            sv.load_prefix(&img[..regs.len()]);
            sv.tf.sanitize();
        }

        match ops.transfer {
            PutTransfer::None => {}
            PutTransfer::Copy { src, dst } => {
                let extent = self.procs[p].pdir.extract(src.start(), src.size());
                self.procs[c].pdir.copy_range(dst.start(), &extent);
            }
            PutTransfer::Zero(dst) => self.procs[c].pdir.clear_range(dst.start(), dst.size()),
        }

        if let Some((dst, perm)) = ops.perm {
            if let Err(e) = self.procs[c].pdir.set_perm(dst.start(), dst.size(), perm) {
                panic!("{}: no memory for permissions in {}: {}", p, c, e);
            }
        }

        if req.snap {
            let window = Region::user_window();
            let child = &mut self.procs[c];
            let extent = child.pdir.extract(window.start(), window.size());
            child.rpdir.copy_range(window.start(), &extent);
            debug!("{}: snapshot of {}", p, c);
        }

        if req.start {
            self.proc_ready(c);
        }

        Ok(self.trap_return(tf))
    }

    /// Pull registers and memory out of a stopped child, or set
    /// permissions on the caller's own memory.
    fn do_get(&mut self, tf: &mut TrapFrame) -> Flow<Divert> {
        let args = Args::from_frame(tf);
        let (req, ops) = self.checked(tf, GetRequest::decode(args.cmd), &args)?;
        let p = self.running();
        let slot = ChildSlot::from_reg(args.child);

        let lock = self.procs[p].lock_handle();
        let children = lock.lock();
        let c = children.get(slot).unwrap_or(ProcId::NULL);
        if self.procs[c].state != ProcStatus::Stop {
            return Err(self.proc_wait(children, c, tf));
        }
        drop(children);

        if let Some(regs) = req.regs {
            let img = self.procs[c].sv.to_bytes();
            self.usercopy(tf, UserCopy::ToUser(&img[..regs.len()]), args.buf)?;
        }

        match ops.transfer {
            GetTransfer::None => {}
            GetTransfer::Copy { src, dst } => {
                let extent = self.procs[c].pdir.extract(src.start(), src.size());
                self.procs[p].pdir.copy_range(dst.start(), &extent);
            }
            GetTransfer::Zero(dst) => self.procs[p].pdir.clear_range(dst.start(), dst.size()),
            GetTransfer::Merge { src, dst } => {
                let child = &self.procs[c];
                let changed = child.pdir.extract(src.start(), src.size());
                let reference = child.rpdir.extract(src.start(), src.size());
                self.procs[p].pdir.merge_range(dst.start(), &changed, &reference);
            }
        }

        if let Some((dst, perm)) = ops.perm {
            if let Err(e) = self.procs[p].pdir.set_perm(dst.start(), dst.size(), perm) {
                panic!("{}: no memory for permissions: {}", p, e);
            }
        }

        Ok(self.trap_return(tf))
    }

    /// Stop and hand control to the parent.
    fn do_ret(&mut self, tf: &mut TrapFrame) -> Divert {
        self.proc_ret(tf, SaveMode::Complete)
    }
}

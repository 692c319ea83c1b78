//! Trap Frames and Saved Register State
//!
//! Defines the i386 trap frame captured on kernel entry, the per-process
//! register image (`ProcState`) that parents read and write with GET and
//! PUT, and the hardware fault descriptor delivered by the trap entry.
//!
//! # Trap Sources
//! - `T_SYSCALL`: the user `INT 0x30` instruction
//! - `T_GPFLT`, `T_PGFLT`: protection and page faults, either raised by
//!   the processor or synthesized by the kernel on bad syscall arguments
//!
//! # Security Considerations
//! - A register image written by a parent is sanitized before the child
//!   can run (see [`TrapFrame::sanitize`])
//! - The byte image layout is fixed so user buffers map 1:1 onto fields

use bitflags::bitflags;

use crate::mm::address::VirtAddr;

/// Breakpoint.
pub const T_BRKPT: u32 = 3;
/// General protection fault.
pub const T_GPFLT: u32 = 13;
/// Page fault.
pub const T_PGFLT: u32 = 14;
/// System call vector.
pub const T_SYSCALL: u32 = 48;

/// Length in bytes of the `INT 0x30` instruction.
pub const SYSCALL_INSN_LEN: u32 = 2;

/// Page fault error code bits.
pub mod pfe {
    /// The fault was a protection violation on a present page.
    pub const PRESENT: u32 = 1 << 0;
    /// The faulting access was a write.
    pub const WRITE: u32 = 1 << 1;
    /// The access originated in user mode.
    pub const USER: u32 = 1 << 2;
}

/// Segment selectors from the global descriptor table.
pub mod gdt {
    /// Kernel code segment.
    pub const KCODE: u32 = 0x08;
    /// Kernel data segment.
    pub const KDATA: u32 = 0x10;
    /// User code segment.
    pub const UCODE: u32 = 0x18;
    /// User data segment.
    pub const UDATA: u32 = 0x20;
    /// Requested privilege level for user mode.
    pub const RPL_USER: u32 = 3;
}

bitflags! {
    /// EFLAGS bits the kernel cares about.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EFlags: u32 {
        const CF = 1 << 0;
        const PF = 1 << 2;
        const AF = 1 << 4;
        const ZF = 1 << 6;
        const SF = 1 << 7;
        const TF = 1 << 8;
        /// Interrupt enable.
        const IF = 1 << 9;
        const DF = 1 << 10;
        const OF = 1 << 11;
        /// I/O privilege level.
        const IOPL = 3 << 12;
        /// Arithmetic and direction flags: the only bits user code controls.
        const USER = Self::CF.bits() | Self::PF.bits() | Self::AF.bits()
            | Self::ZF.bits() | Self::SF.bits() | Self::DF.bits() | Self::OF.bits();
    }
}

/// Trap frame saved on kernel entry (i386 layout).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    pub edi: u32,
    pub esi: u32,
    pub ebp: u32,
    /// Ignored on restore.
    pub oesp: u32,
    pub ebx: u32,
    pub edx: u32,
    pub ecx: u32,
    pub eax: u32,
    pub es: u32,
    pub ds: u32,
    pub trapno: u32,
    pub err: u32,
    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
    pub esp: u32,
    pub ss: u32,
}

impl TrapFrame {
    /// Number of 32-bit words in the frame.
    pub const WORDS: usize = 17;

    /// A fresh user-mode frame with interrupts enabled.
    pub fn user() -> Self {
        let mut tf = Self::default();
        tf.sanitize();
        tf
    }

    /// Force user segments and strip every flag user code may not set.
    pub fn sanitize(&mut self) {
        let udata = gdt::UDATA | gdt::RPL_USER;
        self.ds = udata;
        self.es = udata;
        self.ss = udata;
        self.cs = gdt::UCODE | gdt::RPL_USER;
        let user = EFlags::from_bits_truncate(self.eflags) & EFlags::USER;
        self.eflags = (user | EFlags::IF).bits();
    }

    fn words(&self) -> [u32; Self::WORDS] {
        [
            self.edi, self.esi, self.ebp, self.oesp, self.ebx, self.edx, self.ecx, self.eax,
            self.es, self.ds, self.trapno, self.err, self.eip, self.cs, self.eflags, self.esp,
            self.ss,
        ]
    }

    fn from_words(w: [u32; Self::WORDS]) -> Self {
        Self {
            edi: w[0],
            esi: w[1],
            ebp: w[2],
            oesp: w[3],
            ebx: w[4],
            edx: w[5],
            ecx: w[6],
            eax: w[7],
            es: w[8],
            ds: w[9],
            trapno: w[10],
            err: w[11],
            eip: w[12],
            cs: w[13],
            eflags: w[14],
            esp: w[15],
            ss: w[16],
        }
    }
}

/// Size of the FXSAVE area.
pub const FX_LEN: usize = 512;

/// A process's saved register state.
///
/// Valid only while the process is stopped; the byte image is what
/// parents transfer with `SYS_REGS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcState {
    /// Integer registers and trap state.
    pub tf: TrapFrame,
    /// Pending fault flags.
    pub pff: u32,
    /// Floating point and vector state (FXSAVE image).
    pub fx: [u8; FX_LEN],
}

impl ProcState {
    /// Bytes covering the integer registers only (everything before `fx`).
    pub const INT_LEN: usize = (TrapFrame::WORDS + 1) * 4;
    /// Bytes covering the whole image, FPU state included.
    pub const FULL_LEN: usize = Self::INT_LEN + FX_LEN;

    /// Serialize to the little-endian image seen by user code.
    pub fn to_bytes(&self) -> [u8; Self::FULL_LEN] {
        let mut img = [0u8; Self::FULL_LEN];
        let words = self.tf.words();
        let regs = words.iter().chain(core::iter::once(&self.pff));
        for (chunk, word) in img.chunks_exact_mut(4).zip(regs) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        img[Self::INT_LEN..].copy_from_slice(&self.fx);
        img
    }

    /// Rebuild from a full image.
    pub fn from_bytes(img: &[u8; Self::FULL_LEN]) -> Self {
        let word = |i: usize| {
            let mut b = [0u8; 4];
            b.copy_from_slice(&img[i * 4..i * 4 + 4]);
            u32::from_le_bytes(b)
        };
        let mut w = [0u32; TrapFrame::WORDS];
        for (i, slot) in w.iter_mut().enumerate() {
            *slot = word(i);
        }
        let mut fx = [0u8; FX_LEN];
        fx.copy_from_slice(&img[Self::INT_LEN..]);
        Self {
            tf: TrapFrame::from_words(w),
            pff: word(TrapFrame::WORDS),
            fx,
        }
    }

    /// Overwrite the first `bytes.len()` bytes of the image.
    pub fn load_prefix(&mut self, bytes: &[u8]) {
        let mut img = self.to_bytes();
        img[..bytes.len()].copy_from_slice(bytes);
        *self = Self::from_bytes(&img);
    }
}

impl Default for ProcState {
    fn default() -> Self {
        Self {
            tf: TrapFrame::default(),
            pff: 0,
            fx: [0; FX_LEN],
        }
    }
}

/// A hardware fault as delivered by the trap entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    /// Trap vector.
    pub trapno: u32,
    /// Hardware error code.
    pub err: u32,
    /// Faulting address (CR2 for page faults).
    pub addr: VirtAddr,
}

impl Fault {
    /// A page fault at `addr`.
    pub const fn page(addr: VirtAddr, err: u32) -> Self {
        Self {
            trapno: T_PGFLT,
            err,
            addr,
        }
    }
}

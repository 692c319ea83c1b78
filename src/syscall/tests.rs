//! End-to-end syscall scenarios.
//!
//! Each test boots a kernel with the root process running and drives it
//! through trap entries, the way user code executing `INT 0x30` would.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use super::command::{types, Cmd};
use super::handler::CPUTS_MAX;
use crate::drivers::BufferConsole;
use crate::kernel::{Exit, Kernel, Limits};
use crate::mm::address::{VirtAddr, PAGE_SIZE, USER_HI, USER_LO};
use crate::mm::space::Perm;
use crate::proc::{ChildSlot, ProcId, ProcStatus};
use crate::trap::{
    gdt, pfe, EFlags, ProcState, TrapFrame, SYSCALL_INSN_LEN, T_BRKPT, T_GPFLT, T_PGFLT,
    T_SYSCALL,
};

const LO: u32 = USER_LO as u32;
const PG: u32 = PAGE_SIZE as u32;

/// Where the test harness keeps register images in a process's memory.
const SCRATCH: u32 = LO;
/// Pages given to a spawned child.
const CHILD_PAGES: u32 = 4;
/// Entry point used for spawned children.
const CHILD_ENTRY: u32 = 0x4010_0000;

fn boot() -> (Kernel, BufferConsole) {
    boot_with(Limits::default())
}

fn boot_with(limits: Limits) -> (Kernel, BufferConsole) {
    let console = BufferConsole::new();
    let mut k = Kernel::with_limits(Box::new(console.clone()), limits);
    map(&mut k, ProcId::ROOT, LO, 8 * PG, Perm::RW);
    (k, console)
}

/// Registers for one syscall.
#[derive(Clone, Copy, Default)]
struct Call {
    cmd: u32,
    child: u32,
    buf: u32,
    src: u32,
    dst: u32,
    size: u32,
}

fn put(flags: Cmd) -> Call {
    Call {
        cmd: types::PUT | flags.bits(),
        ..Call::default()
    }
}

fn get(flags: Cmd) -> Call {
    Call {
        cmd: types::GET | flags.bits(),
        ..Call::default()
    }
}

/// Execute a syscall instruction in the running process.
fn sys(k: &mut Kernel, call: Call) -> Exit {
    let tf = k.frame_mut();
    tf.eax = call.cmd;
    tf.edx = call.child;
    tf.ebx = call.buf;
    tf.esi = call.src;
    tf.edi = call.dst;
    tf.ecx = call.size;
    tf.eip = tf.eip.wrapping_add(SYSCALL_INSN_LEN);
    k.trap(T_SYSCALL, 0)
}

fn map(k: &mut Kernel, id: ProcId, va: u32, size: u32, perm: Perm) {
    k.space_mut(id)
        .set_perm(VirtAddr::new(va as usize), size as usize, perm)
        .unwrap();
}

/// Store bytes as the process itself would.
fn poke(k: &mut Kernel, id: ProcId, va: u32, bytes: &[u8]) {
    k.space_mut(id).write(VirtAddr::new(va as usize), bytes).unwrap();
}

fn peek(k: &Kernel, id: ProcId, va: u32, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    k.process(id)
        .pdir
        .read(VirtAddr::new(va as usize), &mut buf)
        .unwrap();
    buf
}

fn child_of(k: &Kernel, parent: ProcId, slot: u8) -> ProcId {
    k.process(parent).child(ChildSlot::new(slot)).unwrap()
}

fn image(tf: TrapFrame) -> ProcState {
    ProcState {
        tf,
        ..ProcState::default()
    }
}

/// Start a child of the root in slot 0 and let it run.
///
/// The root ends up waiting in a GET of the child's registers, the child
/// owns `CHILD_PAGES` zeroed RW pages at `USER_LO` and is on the CPU.
fn spawn(k: &mut Kernel) -> ProcId {
    let tf = TrapFrame {
        eip: CHILD_ENTRY,
        ..TrapFrame::user()
    };
    poke(k, ProcId::ROOT, SCRATCH, &image(tf).to_bytes()[..ProcState::INT_LEN]);
    let start = Call {
        buf: SCRATCH,
        dst: LO,
        size: CHILD_PAGES * PG,
        ..put(Cmd::REGS | Cmd::PERM | Cmd::RW | Cmd::START)
    };
    assert_eq!(sys(k, start), Exit::Resume);
    let c = child_of(k, ProcId::ROOT, 0);

    let wait = Call {
        buf: SCRATCH,
        ..get(Cmd::REGS)
    };
    assert_eq!(sys(k, wait), Exit::Block);
    assert_eq!(k.current(), Some(c));
    c
}

/// Resume the waiting root and fetch the child's register image.
fn collect(k: &mut Kernel, c: ProcId) -> ProcState {
    assert_eq!(k.process(c).state, ProcStatus::Stop);
    assert_eq!(k.current(), Some(ProcId::ROOT));
    let call = Call {
        buf: SCRATCH,
        ..get(Cmd::REGS | Cmd::FPU)
    };
    assert_eq!(sys(k, call), Exit::Resume);
    let bytes = peek(k, ProcId::ROOT, SCRATCH, ProcState::FULL_LEN);
    let mut img = [0u8; ProcState::FULL_LEN];
    img.copy_from_slice(&bytes);
    ProcState::from_bytes(&img)
}

#[test]
fn test_cputs_writes_console_and_resumes() {
    let (mut k, console) = boot();
    poke(&mut k, ProcId::ROOT, LO, b"hello\0ignored");
    let eip = k.frame().eip;
    let call = Call {
        cmd: types::CPUTS,
        buf: LO,
        ..Call::default()
    };
    assert_eq!(sys(&mut k, call), Exit::Resume);
    assert_eq!(console.contents(), b"hello");
    assert_eq!(k.frame().eip, eip + SYSCALL_INSN_LEN);
}

#[test]
fn test_cputs_stops_at_limit() {
    let (mut k, console) = boot();
    poke(&mut k, ProcId::ROOT, LO, &[b'x'; 300]);
    let call = Call {
        cmd: types::CPUTS,
        buf: LO,
        ..Call::default()
    };
    sys(&mut k, call);
    assert_eq!(console.contents(), vec![b'x'; CPUTS_MAX]);
}

#[test]
fn test_put_get_register_round_trip() {
    let (mut k, _) = boot();
    let tf = TrapFrame {
        eax: 7,
        ebx: 0xdead_beef,
        esp: 0x5000_0000,
        eip: 0x4000_1000,
        eflags: 0xffff_ffff,
        cs: gdt::KCODE,
        ds: gdt::KDATA,
        es: 0,
        ss: 0,
        ..TrapFrame::default()
    };
    let mut sent = image(tf);
    sent.pff = 9;
    poke(&mut k, ProcId::ROOT, SCRATCH, &sent.to_bytes()[..ProcState::INT_LEN]);
    let call = Call {
        child: 0x1_05,
        buf: SCRATCH,
        ..put(Cmd::REGS)
    };
    assert_eq!(sys(&mut k, call), Exit::Resume);

    // Only the low byte of edx names the slot.
    let c = child_of(&k, ProcId::ROOT, 5);
    let saved = &k.process(c).sv;
    assert_eq!(k.process(c).state, ProcStatus::Stop);
    assert_eq!(k.process(c).parent, Some(ProcId::ROOT));
    assert_eq!((saved.tf.eax, saved.tf.ebx), (7, 0xdead_beef));
    assert_eq!((saved.tf.eip, saved.tf.esp), (0x4000_1000, 0x5000_0000));
    assert_eq!(saved.pff, 9);
    assert_eq!(saved.tf.cs, gdt::UCODE | gdt::RPL_USER);
    for seg in [saved.tf.ds, saved.tf.es, saved.tf.ss] {
        assert_eq!(seg, gdt::UDATA | gdt::RPL_USER);
    }
    assert_eq!(saved.tf.eflags, (EFlags::USER | EFlags::IF).bits());

    let out = LO + PG;
    let call = Call {
        child: 5,
        buf: out,
        ..get(Cmd::REGS)
    };
    assert_eq!(sys(&mut k, call), Exit::Resume);
    let expected = k.process(c).sv.to_bytes();
    assert_eq!(
        peek(&k, ProcId::ROOT, out, ProcState::INT_LEN),
        &expected[..ProcState::INT_LEN]
    );
    // The integer transfer leaves the bytes after the image alone.
    assert_eq!(peek(&k, ProcId::ROOT, out + ProcState::INT_LEN as u32, 4), [0; 4]);
}

#[test]
fn test_put_with_fpu_moves_full_image() {
    let (mut k, _) = boot();
    let mut sent = image(TrapFrame::user());
    sent.fx[0] = 0x7f;
    sent.fx[511] = 0x01;
    poke(&mut k, ProcId::ROOT, SCRATCH, &sent.to_bytes());
    let call = Call {
        buf: SCRATCH,
        ..put(Cmd::REGS | Cmd::FPU)
    };
    sys(&mut k, call);
    let c = child_of(&k, ProcId::ROOT, 0);
    assert_eq!(k.process(c).sv.fx[0], 0x7f);
    assert_eq!(k.process(c).sv.fx[511], 0x01);
}

#[test]
fn test_copy_is_idempotent() {
    let (mut k, _) = boot();
    let pattern: Vec<u8> = (0..2 * PAGE_SIZE).map(|i| (i % 251) as u8).collect();
    poke(&mut k, ProcId::ROOT, LO, &pattern);
    let call = Call {
        src: LO,
        dst: LO + 0x10_0000,
        size: 2 * PG,
        ..put(Cmd::COPY)
    };
    sys(&mut k, call);
    let c = child_of(&k, ProcId::ROOT, 0);
    let first = peek(&k, c, LO + 0x10_0000, pattern.len());
    sys(&mut k, call);
    assert_eq!(peek(&k, c, LO + 0x10_0000, pattern.len()), first);
    assert_eq!(first, pattern);
    assert_eq!(k.process(c).pdir.mapped_pages(), 2);

    let back = Call {
        src: LO + 0x10_0000,
        dst: LO + 0x20_0000,
        size: 2 * PG,
        ..get(Cmd::COPY)
    };
    sys(&mut k, back);
    assert_eq!(peek(&k, ProcId::ROOT, LO + 0x20_0000, pattern.len()), pattern);
}

#[test]
fn test_zero_and_perm() {
    let (mut k, _) = boot();
    let call = Call {
        dst: LO,
        size: 2 * PG,
        ..put(Cmd::PERM | Cmd::READ)
    };
    sys(&mut k, call);
    let c = child_of(&k, ProcId::ROOT, 0);
    assert_eq!(k.process(c).pdir.perm(VirtAddr::new(USER_LO)), Some(Perm::READ));
    assert_eq!(k.process(c).pdir.mapped_pages(), 2);

    let zero = Call {
        dst: LO + PG,
        size: PG,
        ..put(Cmd::ZERO)
    };
    sys(&mut k, zero);
    assert_eq!(k.process(c).pdir.mapped_pages(), 1);

    // GET with PERM applies to the caller's own memory.
    let own = Call {
        dst: LO,
        size: PG,
        ..get(Cmd::PERM | Cmd::READ)
    };
    sys(&mut k, own);
    assert_eq!(k.process(ProcId::ROOT).pdir.perm(VirtAddr::new(USER_LO)), Some(Perm::READ));
}

#[test]
fn test_merge_of_unchanged_child_keeps_parent() {
    let (mut k, _) = boot();
    poke(&mut k, ProcId::ROOT, LO, &[0x11; PAGE_SIZE]);
    let snap = Call {
        src: LO,
        dst: LO,
        size: PG,
        ..put(Cmd::COPY | Cmd::SNAP)
    };
    sys(&mut k, snap);
    poke(&mut k, ProcId::ROOT, LO + 10, &[0x22]);

    let merge = Call {
        src: LO,
        dst: LO,
        size: PG,
        ..get(Cmd::MERGE)
    };
    assert_eq!(sys(&mut k, merge), Exit::Resume);
    let page = peek(&k, ProcId::ROOT, LO, PAGE_SIZE);
    assert_eq!(page[10], 0x22);
    assert_eq!(page[11], 0x11);
}

#[test]
fn test_merge_of_fully_modified_child_replaces_parent() {
    let (mut k, _) = boot();
    poke(&mut k, ProcId::ROOT, LO, &[0x11; PAGE_SIZE]);
    let snap = Call {
        src: LO,
        dst: LO,
        size: PG,
        ..put(Cmd::COPY | Cmd::SNAP)
    };
    sys(&mut k, snap);
    let c = child_of(&k, ProcId::ROOT, 0);
    poke(&mut k, c, LO, &[0xaa; PAGE_SIZE]);

    let merge = Call {
        src: LO,
        dst: LO,
        size: PG,
        ..get(Cmd::MERGE)
    };
    sys(&mut k, merge);
    assert_eq!(peek(&k, ProcId::ROOT, LO, PAGE_SIZE), vec![0xaa; PAGE_SIZE]);
}

#[test]
fn test_snapshot_then_merge_combines_changes() {
    let (mut k, _) = boot();
    poke(&mut k, ProcId::ROOT, LO, &[0; PAGE_SIZE]);
    let snap = Call {
        src: LO,
        dst: LO,
        size: PG,
        ..put(Cmd::COPY | Cmd::SNAP)
    };
    sys(&mut k, snap);
    let c = child_of(&k, ProcId::ROOT, 0);
    poke(&mut k, c, LO, b"kid!");
    poke(&mut k, ProcId::ROOT, LO + 100, b"dad!");

    let merge = Call {
        src: LO,
        dst: LO,
        size: PG,
        ..get(Cmd::MERGE)
    };
    sys(&mut k, merge);
    assert_eq!(peek(&k, ProcId::ROOT, LO, 4), b"kid!");
    assert_eq!(peek(&k, ProcId::ROOT, LO + 100, 4), b"dad!");
}

#[test]
fn test_get_of_empty_slot_reads_null_process() {
    let (mut k, _) = boot();
    poke(&mut k, ProcId::ROOT, SCRATCH, &[0xff; ProcState::INT_LEN]);
    let call = Call {
        child: 42,
        buf: SCRATCH,
        ..get(Cmd::REGS)
    };
    assert_eq!(sys(&mut k, call), Exit::Resume);
    assert_eq!(peek(&k, ProcId::ROOT, SCRATCH, ProcState::INT_LEN), vec![0; ProcState::INT_LEN]);
    assert_eq!(k.process(ProcId::ROOT).child(ChildSlot::new(42)), None);
}

#[test]
fn test_wait_and_wake() {
    let (mut k, _) = boot();
    let tf = TrapFrame {
        eip: CHILD_ENTRY,
        ..TrapFrame::user()
    };
    poke(&mut k, ProcId::ROOT, SCRATCH, &image(tf).to_bytes()[..ProcState::INT_LEN]);
    let start = Call {
        buf: SCRATCH,
        ..put(Cmd::REGS | Cmd::START)
    };
    assert_eq!(sys(&mut k, start), Exit::Resume);
    let c = child_of(&k, ProcId::ROOT, 0);
    assert_eq!(k.process(c).state, ProcStatus::Ready);
    assert_eq!(k.ready_queue().collect::<Vec<_>>(), vec![c]);

    // GET of a running child blocks the root with its syscall rolled back.
    let int_at = k.frame().eip;
    let wait = Call {
        buf: SCRATCH,
        ..get(Cmd::REGS)
    };
    assert_eq!(sys(&mut k, wait), Exit::Block);
    assert_eq!(k.process(ProcId::ROOT).state, ProcStatus::Wait(c));
    assert_eq!(k.process(ProcId::ROOT).sv.tf.eip, int_at);
    assert_eq!(k.current(), Some(c));
    assert_eq!(k.frame().eip, CHILD_ENTRY);

    // RET completes the child's syscall and wakes the root.
    let ret = Call {
        cmd: types::RET,
        ..Call::default()
    };
    assert_eq!(sys(&mut k, ret), Exit::Stop);
    assert_eq!(k.process(c).state, ProcStatus::Stop);
    assert_eq!(k.process(c).sv.tf.eip, CHILD_ENTRY + SYSCALL_INSN_LEN);
    assert_eq!(k.current(), Some(ProcId::ROOT));
    assert_eq!(k.frame().eip, int_at);

    // The re-executed GET now finds the child stopped.
    assert_eq!(sys(&mut k, wait), Exit::Resume);
    let got = peek(&k, ProcId::ROOT, SCRATCH, ProcState::INT_LEN);
    assert_eq!(got, &k.process(c).sv.to_bytes()[..ProcState::INT_LEN]);
    assert_eq!(k.frame().eip, int_at + SYSCALL_INSN_LEN);
}

#[test]
fn test_put_to_running_child_waits() {
    let (mut k, _) = boot();
    let c = spawn(&mut k);
    // The child starts its own child, then stops.
    assert_eq!(sys(&mut k, put(Cmd::START)), Exit::Resume);
    let g = child_of(&k, c, 0);
    assert_eq!(k.process(g).state, ProcStatus::Ready);
    assert_eq!(sys(&mut k, put(Cmd::empty())), Exit::Block);
    assert_eq!(k.process(c).state, ProcStatus::Wait(g));
    assert_eq!(k.process(ProcId::ROOT).state, ProcStatus::Wait(c));
    assert_eq!(k.current(), Some(g));

    let ret = Call {
        cmd: types::RET,
        ..Call::default()
    };
    assert_eq!(sys(&mut k, ret), Exit::Stop);
    assert_eq!(k.current(), Some(c));
    assert_eq!(sys(&mut k, put(Cmd::empty())), Exit::Resume);
    assert_eq!(k.process(ProcId::ROOT).state, ProcStatus::Wait(c));
}

#[test]
fn test_misaligned_size_is_gp_without_effect() {
    let (mut k, _) = boot();
    let c = spawn(&mut k);
    let pages = k.process(c).pdir.mapped_pages();
    let int_at = k.frame().eip;
    let call = Call {
        src: LO,
        dst: LO,
        size: PG + 1,
        ..put(Cmd::COPY | Cmd::PERM | Cmd::RW)
    };
    assert_eq!(sys(&mut k, call), Exit::Stop);

    // Rejected before the grandchild was created.
    assert_eq!(k.process(c).child(ChildSlot::new(0)), None);
    assert_eq!(k.process(c).pdir.mapped_pages(), pages);

    let sv = collect(&mut k, c);
    assert_eq!(sv.tf.trapno, T_GPFLT);
    assert_eq!(sv.tf.err, 0);
    assert_eq!(sv.tf.eip, int_at);
}

#[test]
fn test_get_misaligned_size_is_gp_without_effect() {
    let (mut k, _) = boot();
    let c = spawn(&mut k);
    poke(&mut k, c, LO + PG, b"kept");
    let pages = k.process(c).pdir.mapped_pages();
    let int_at = k.frame().eip;
    let call = Call {
        src: LO,
        dst: LO,
        size: PG + 1,
        ..get(Cmd::COPY | Cmd::PERM | Cmd::READ)
    };
    assert_eq!(sys(&mut k, call), Exit::Stop);

    // Neither the copy from the empty slot nor the permission change ran.
    assert_eq!(k.process(c).pdir.mapped_pages(), pages);
    assert_eq!(peek(&k, c, LO + PG, 4), b"kept");
    assert_eq!(
        k.process(c).pdir.perm(VirtAddr::new(USER_LO)),
        Some(Perm::RW)
    );

    let sv = collect(&mut k, c);
    assert_eq!(sv.tf.trapno, T_GPFLT);
    assert_eq!(sv.tf.err, 0);
    assert_eq!(sv.tf.eip, int_at);
}

#[test]
fn test_region_outside_window_is_gp() {
    let (mut k, _) = boot();
    let c = spawn(&mut k);
    let call = Call {
        dst: USER_HI as u32,
        size: PG,
        ..get(Cmd::PERM | Cmd::RW)
    };
    assert_eq!(sys(&mut k, call), Exit::Stop);
    assert_eq!(collect(&mut k, c).tf.trapno, T_GPFLT);
}

#[test]
fn test_rejected_flag_combinations_are_gp() {
    for flags in [Cmd::SNAP, Cmd::START] {
        let (mut k, _) = boot();
        let c = spawn(&mut k);
        assert_eq!(sys(&mut k, get(flags)), Exit::Stop);
        assert_eq!(collect(&mut k, c).tf.trapno, T_GPFLT);
    }

    let (mut k, _) = boot();
    let c = spawn(&mut k);
    let merge = Call {
        src: LO,
        dst: LO,
        size: PG,
        ..put(Cmd::MERGE)
    };
    assert_eq!(sys(&mut k, merge), Exit::Stop);
    assert_eq!(k.process(c).child(ChildSlot::new(0)), None);
    assert_eq!(collect(&mut k, c).tf.trapno, T_GPFLT);
}

#[test]
fn test_cputs_across_window_top_is_page_fault() {
    let (mut k, console) = boot();
    let c = spawn(&mut k);
    let int_at = k.frame().eip;
    let call = Call {
        cmd: types::CPUTS,
        buf: USER_HI as u32 - 10,
        ..Call::default()
    };
    assert_eq!(sys(&mut k, call), Exit::Stop);
    assert!(console.contents().is_empty());
    assert!(!k.cpu.is_armed());

    let sv = collect(&mut k, c);
    assert_eq!((sv.tf.trapno, sv.tf.err), (T_PGFLT, 0));
    assert_eq!(sv.tf.eip, int_at);
}

#[test]
fn test_copy_fault_reflects_hardware_error() {
    let (mut k, console) = boot();
    let c = spawn(&mut k);

    // Reading past the child's last page faults on a missing page.
    let call = Call {
        cmd: types::CPUTS,
        buf: LO + CHILD_PAGES * PG - 10,
        ..Call::default()
    };
    assert_eq!(sys(&mut k, call), Exit::Stop);
    assert!(console.contents().is_empty());
    assert!(!k.cpu.is_armed());
    let sv = collect(&mut k, c);
    assert_eq!((sv.tf.trapno, sv.tf.err), (T_PGFLT, 0));
}

#[test]
fn test_copy_out_to_read_only_page_faults() {
    let (mut k, _) = boot();
    let c = spawn(&mut k);
    let ro = LO + 3 * PG;
    let protect = Call {
        child: 9,
        dst: ro,
        size: PG,
        ..get(Cmd::PERM | Cmd::READ)
    };
    assert_eq!(sys(&mut k, protect), Exit::Resume);

    let int_at = k.frame().eip;
    let call = Call {
        child: 9,
        buf: ro,
        ..get(Cmd::REGS)
    };
    assert_eq!(sys(&mut k, call), Exit::Stop);
    let sv = collect(&mut k, c);
    assert_eq!(sv.tf.trapno, T_PGFLT);
    assert_eq!(sv.tf.err, pfe::PRESENT | pfe::WRITE);
    assert_eq!(sv.tf.eip, int_at);
}

#[test]
fn test_unknown_call_type_reflects_as_trap() {
    let (mut k, _) = boot();
    let c = spawn(&mut k);
    let int_at = k.frame().eip;
    let call = Call {
        cmd: 0x5,
        ..Call::default()
    };
    assert_eq!(sys(&mut k, call), Exit::Stop);
    let sv = collect(&mut k, c);
    assert_eq!(sv.tf.trapno, T_SYSCALL);
    assert_eq!(sv.tf.eip, int_at + SYSCALL_INSN_LEN);
}

#[test]
fn test_user_trap_reflects_to_parent() {
    let (mut k, _) = boot();
    let c = spawn(&mut k);
    k.frame_mut().eip = CHILD_ENTRY + 0x40;
    assert_eq!(k.trap(T_BRKPT, 0), Exit::Stop);
    let sv = collect(&mut k, c);
    assert_eq!(sv.tf.trapno, T_BRKPT);
    assert_eq!(sv.tf.eip, CHILD_ENTRY + 0x40);
}

#[test]
fn test_root_ret_halts() {
    let (mut k, _) = boot();
    let call = Call {
        cmd: types::RET,
        ..Call::default()
    };
    assert_eq!(sys(&mut k, call), Exit::Stop);
    assert!(k.is_halted());
    assert_eq!(k.current(), None);
    assert_eq!(k.process(ProcId::ROOT).state, ProcStatus::Stop);
}

#[test]
#[should_panic(expected = "in root process")]
fn test_root_trap_panics() {
    let (mut k, _) = boot();
    k.trap(T_GPFLT, 0);
}

#[test]
#[should_panic(expected = "no memory for child")]
fn test_child_exhaustion_panics() {
    let (mut k, _) = boot_with(Limits {
        max_procs: 3,
        ..Limits::default()
    });
    sys(&mut k, put(Cmd::empty()));
    let second = Call {
        child: 1,
        ..put(Cmd::empty())
    };
    sys(&mut k, second);
}

#[test]
#[should_panic(expected = "no memory for permissions")]
fn test_permission_exhaustion_panics() {
    let (mut k, _) = boot_with(Limits {
        max_pages: 16,
        ..Limits::default()
    });
    let call = Call {
        dst: LO,
        size: 32 * PG,
        ..put(Cmd::PERM | Cmd::RW)
    };
    sys(&mut k, call);
}

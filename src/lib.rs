//! Arbor - Process-Tree Microkernel Core
//!
//! The process-control core of a microkernel in which every process is
//! managed by its parent. A parent creates, inspects and runs children
//! with three system calls:
//!
//! - PUT pushes registers, memory and permissions into a child and may
//!   start it
//! - GET waits for a child to stop and pulls its registers and memory
//!   back, optionally merging the child's changes
//! - RET stops the caller and returns control to its parent
//!
//! Faults and rejected arguments are not handled by the kernel: they stop
//! the faulting process and are reflected to its parent.
//!
//! # Security Features
//! - Memory safety via Rust's ownership model
//! - Every user address is validated before use, and kernel copies to or
//!   from user memory recover from faults
//! - A child can only be changed while it is stopped
//! - Register images pushed by a parent are sanitized before they run
//!
//! # Architecture
//! - Register model: i386 trap frames
//! - Host-testable: the library is `no_std` outside of unit tests and the
//!   embedding kernel image provides the global allocator

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod cpu;
pub mod drivers;
pub mod kernel;
pub mod logger;
pub mod mm;
pub mod proc;
pub mod syscall;
pub mod trap;

pub use kernel::{Divert, Exit, Kernel, Limits};

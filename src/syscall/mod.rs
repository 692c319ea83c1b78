//! System Call Interface
//!
//! Process-control calls through which a parent manages its children.
//!
//! # Security Model
//! - Whitelist approach: only the four call types below are handled;
//!   any other type value is reflected to the parent as a trap
//! - All parameters are validated before any state changes
//! - Invalid inputs become traps reflected to the caller's parent, never
//!   kernel panics
//!
//! # Calls
//! - 0: CPUTS(buf) - write a string to the console
//! - 1: PUT(cmd, child, buf, src, dst, size) - push state into a child
//! - 2: GET(cmd, child, buf, src, dst, size) - pull state out of a child
//! - 3: RET - stop and return to the parent

mod command;
mod handler;
mod usercopy;
mod validate;

#[cfg(test)]
mod tests;

pub use command::{
    types, Args, Cmd, DecodeError, GetMemOp, GetRequest, Op, PutMemOp, PutRequest, RegSet,
};
pub use handler::CPUTS_MAX;
pub use validate::{GetTransfer, MemRequest, Operands, PutTransfer, Region, UserRange};

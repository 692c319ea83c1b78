//! Console Drivers
//!
//! The kernel writes CPUTS output to a [`Console`]. Two sinks are
//! provided: the PL011 serial port and an in-memory buffer.

mod console;
pub mod uart;

pub use console::{BufferConsole, Console};
pub use uart::SerialConsole;

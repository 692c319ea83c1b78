//! PL011 UART Driver
//!
//! Serial console for kernel log output and user CPUTS output. The
//! device is a PL011-compatible MMIO transmitter; the board passes its
//! register base to [`Uart::init`].
//!
//! # Security Considerations
//! - Output only; nothing is read back from the device
//! - Writes before `init` are dropped, so early logging cannot touch an
//!   unmapped device
//! - Uses a spinlock for shared access

use core::fmt::{self, Write};
use spin::Mutex;

use super::Console;

/// PL011 Register offsets
mod regs {
    /// Data Register
    pub const DR: usize = 0x00;
    /// Flag Register
    pub const FR: usize = 0x18;
}

/// Flag Register bits
mod flags {
    /// Transmit FIFO full
    pub const TXFF: u32 = 1 << 5;
}

/// PL011 UART driver
pub struct Uart {
    base: usize,
    initialized: bool,
}

impl Uart {
    /// Create an unattached UART. Output is dropped until [`Uart::init`].
    pub const fn new() -> Self {
        Self {
            base: 0,
            initialized: false,
        }
    }

    /// Attach the UART to the register block at `base` and enable output.
    ///
    /// # Safety
    /// `base` must point at a mapped PL011 register block (or, in tests,
    /// at memory at least as large as the registers used here) for as long
    /// as the UART is used.
    pub unsafe fn init(&mut self, base: usize) {
        self.base = base;
        self.initialized = true;
    }

    fn write_byte(&self, byte: u8) {
        if !self.initialized {
            return;
        }

        // SAFETY: `init` requires `base` to cover the FR and DR registers.
        unsafe {
            let fr = (self.base + regs::FR) as *const u32;
            let dr = (self.base + regs::DR) as *mut u32;

            while core::ptr::read_volatile(fr) & flags::TXFF != 0 {
                core::hint::spin_loop();
            }
            core::ptr::write_volatile(dr, byte as u32);
        }
    }

    /// Write bytes, expanding `\n` to `\r\n`.
    pub fn write_bytes(&self, bytes: &[u8]) {
        for &byte in bytes {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
    }
}

impl Default for Uart {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for Uart {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

impl Console for Uart {
    fn write(&mut self, bytes: &[u8]) {
        self.write_bytes(bytes);
    }
}

/// Global UART instance protected by spinlock
pub static UART: Mutex<Uart> = Mutex::new(Uart::new());

/// Console handle on the global UART.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialConsole;

impl Console for SerialConsole {
    fn write(&mut self, bytes: &[u8]) {
        UART.lock().write_bytes(bytes);
    }
}

/// Print macro for kernel output
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let mut uart = $crate::drivers::uart::UART.lock();
        let _ = write!(uart, $($arg)*);
    }};
}

/// Println macro for kernel output
#[macro_export]
macro_rules! kprintln {
    () => {
        $crate::kprint!("\n")
    };
    ($($arg:tt)*) => {{
        $crate::kprint!($($arg)*);
        $crate::kprint!("\n");
    }};
}

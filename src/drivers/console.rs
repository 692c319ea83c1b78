//! Console sinks.

use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

/// Byte sink for user console output.
pub trait Console: Send {
    /// Write raw bytes. Console output cannot fail.
    fn write(&mut self, bytes: &[u8]);
}

/// Console that keeps everything written to it.
///
/// Clones share the same buffer, so a handle kept outside the kernel
/// sees what the kernel wrote.
#[derive(Clone, Default)]
pub struct BufferConsole {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buf.lock().clone()
    }
}

impl Console for BufferConsole {
    fn write(&mut self, bytes: &[u8]) {
        self.buf.lock().extend_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_output() {
        let console = BufferConsole::new();
        let mut sink = console.clone();
        sink.write(b"hello ");
        sink.write(b"world");
        assert_eq!(console.contents(), b"hello world");
    }
}

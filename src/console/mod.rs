//! Console output, to the boot UART.
//!
//! Normal code prints through [`CONSOLE`], a spin lock around the UART.
//! Trap and panic paths must not take that lock (the interrupted code may
//! hold it), so they write to the UART directly with `uprint!`.

pub mod logger;
pub mod printf;
pub mod sink;

pub use sink::{BufferSink, ByteSink, NullSink, SinkWriter};

use crate::hardware::Uart;
use spin::Mutex;

pub static CONSOLE: Mutex<Console> = Mutex::new(Console::new());

/// The console device. Output is dropped until a UART is attached.
pub struct Console {
    uart: Option<&'static Uart>,
}
impl Console {
    pub const fn new() -> Console {
        Console { uart: None }
    }
    pub fn attach(&mut self, uart: &'static Uart) {
        self.uart = Some(uart);
    }
    pub fn is_attached(&self) -> bool {
        self.uart.is_some()
    }
}
impl Default for Console {
    fn default() -> Console {
        Console::new()
    }
}
impl ByteSink for Console {
    fn write(&mut self, byte: u8) {
        if let Some(uart) = self.uart {
            uart.write_byte(byte);
        }
    }
}
impl core::fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

/// Attach the boot UART to the console.
pub fn init(uart: &'static Uart) {
    CONSOLE.lock().attach(uart);
}

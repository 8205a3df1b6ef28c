//! A `log` backend that prints to the console.

use crate::console::CONSOLE;
use core::fmt::Write;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

static LOGGER: ConsoleLogger = ConsoleLogger;

pub struct ConsoleLogger;
impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }
    /// Never waits for the console: a record logged while it is held, say
    /// from a trap that interrupted a `print!`, is dropped.
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(mut console) = CONSOLE.try_lock() {
            let _ = writeln!(console, "[{:<5}] {}", record.level(), record.args());
        }
    }
    fn flush(&self) {}
}

/// Install the console logger and show records up to `level`.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

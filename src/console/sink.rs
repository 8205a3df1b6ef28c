//! Byte sinks: the one capability trap diagnostics are written through.

use arrayvec::ArrayVec;
use core::fmt;

/// Something bytes can be written to, one at a time.
pub trait ByteSink {
    fn write(&mut self, byte: u8);
    fn write_bytes(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.write(*b);
        }
    }
}
impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write(&mut self, byte: u8) {
        (**self).write(byte)
    }
    fn write_bytes(&mut self, bytes: &[u8]) {
        (**self).write_bytes(bytes)
    }
}

/// A fixed-capacity in-memory sink. Bytes past the capacity are dropped.
#[derive(Clone, Debug, Default)]
pub struct BufferSink<const N: usize> {
    bytes: ArrayVec<u8, N>,
    dropped: usize,
}
impl<const N: usize> BufferSink<N> {
    pub const fn new() -> BufferSink<N> {
        BufferSink {
            bytes: ArrayVec::new_const(),
            dropped: 0,
        }
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
    /// The contents, if they are valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.bytes).ok()
    }
    /// How many bytes did not fit.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.dropped = 0;
    }
}
impl<const N: usize> ByteSink for BufferSink<N> {
    fn write(&mut self, byte: u8) {
        if self.bytes.try_push(byte).is_err() {
            self.dropped += 1;
        }
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;
impl ByteSink for NullSink {
    fn write(&mut self, _byte: u8) {}
}

/// Adapts a [`ByteSink`] to [`core::fmt::Write`].
pub struct SinkWriter<S: ByteSink>(pub S);
impl<S: ByteSink> SinkWriter<S> {
    pub fn into_inner(self) -> S {
        self.0
    }
}
impl<S: ByteSink> fmt::Write for SinkWriter<S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_bytes(s.as_bytes());
        Ok(())
    }
}

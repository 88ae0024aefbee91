//! Simple buffered writer for redrawing terminal lines in one write.

use std::io::{self, Write};

/// Collects everything written to it and only passes it on when flushed,
/// so a status line is never shown half drawn.
pub struct BufWriter<T: Write> {
    inner: T,
    buf: Vec<u8>,
}

impl<T: Write> BufWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(128),
        }
    }
}

impl<T: Write> Write for BufWriter<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.write_all(&self.buf)?;
        self.buf.clear();
        self.inner.flush()
    }
}

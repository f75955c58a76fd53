//! Read and write buffering layer.

use std::io::{self, Read, Write};

use tether_config::Endpoint;

use super::Transport;
use crate::error::TransportError;

/// Buffer capacity used by [`BufferedTransport::new`].
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Coalesces small reads and writes. Writes reach the inner transport on
/// flush or when the buffer fills.
pub struct BufferedTransport<T> {
    inner: T,
    capacity: usize,
    read_buffer: Box<[u8]>,
    read_pos: usize,
    read_len: usize,
    write_buffer: Vec<u8>,
}

impl<T: Transport> BufferedTransport<T> {
    /// Wraps `inner` with [`DEFAULT_BUFFER_SIZE`] buffers.
    #[must_use]
    pub fn new(inner: T) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, inner)
    }

    /// Wraps `inner` with buffers of `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize, inner: T) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            capacity,
            read_buffer: vec![0; capacity].into_boxed_slice(),
            read_pos: 0,
            read_len: 0,
            write_buffer: Vec::with_capacity(capacity),
        }
    }

    /// Inner transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    fn discard_buffers(&mut self) {
        self.read_pos = 0;
        self.read_len = 0;
        self.write_buffer.clear();
    }

    fn drain_write_buffer(&mut self) -> io::Result<()> {
        if !self.write_buffer.is_empty() {
            self.inner.write_all(&self.write_buffer)?;
            self.write_buffer.clear();
        }
        Ok(())
    }
}

impl<T: Transport> Transport for BufferedTransport<T> {
    fn open(&mut self) -> Result<(), TransportError> {
        self.inner.open()?;
        self.discard_buffers();
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.discard_buffers();
        self.inner.close()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn endpoint(&self) -> &Endpoint {
        self.inner.endpoint()
    }

    fn describe(&self) -> String {
        format!("buffered>{}", self.inner.describe())
    }
}

impl<T: Transport> Read for BufferedTransport<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.read_pos == self.read_len {
            if buf.len() >= self.capacity {
                return self.inner.read(buf);
            }
            self.read_len = self.inner.read(&mut self.read_buffer)?;
            self.read_pos = 0;
        }
        let available = self
            .read_buffer
            .get(self.read_pos..self.read_len)
            .unwrap_or_default();
        let count = available.len().min(buf.len());
        if let (Some(target), Some(source)) = (buf.get_mut(..count), available.get(..count)) {
            target.copy_from_slice(source);
        }
        self.read_pos += count;
        Ok(count)
    }
}

impl<T: Transport> Write for BufferedTransport<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.write_buffer.len() + buf.len() > self.capacity {
            self.drain_write_buffer()?;
        }
        if buf.len() >= self.capacity {
            return self.inner.write(buf);
        }
        self.write_buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain_write_buffer()?;
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::test_support::LoopbackTransport;

    #[test]
    fn writes_are_held_until_flush() {
        let (loopback, probe) = LoopbackTransport::new();
        let mut transport = BufferedTransport::new(loopback);
        transport.open().expect("open");

        transport.write_all(b"hello").expect("write");
        assert!(probe.written().is_empty());

        transport.flush().expect("flush");
        assert_eq!(probe.written(), b"hello");
    }

    #[test]
    fn oversized_writes_bypass_buffer() {
        let (loopback, probe) = LoopbackTransport::new();
        let mut transport = BufferedTransport::with_capacity(4, loopback);
        transport.open().expect("open");

        transport.write_all(b"ab").expect("small write");
        transport.write_all(b"abcdef").expect("large write");
        assert_eq!(probe.written(), b"ababcdef");
    }

    #[test]
    fn reads_are_served_from_buffer() {
        let (loopback, probe) = LoopbackTransport::new();
        probe.push_readable(b"thrift");
        let mut transport = BufferedTransport::new(loopback);
        transport.open().expect("open");

        let mut first = [0; 2];
        transport.read_exact(&mut first).expect("read");
        let mut rest = [0; 4];
        transport.read_exact(&mut rest).expect("read");
        assert_eq!((&first, &rest), (b"th", b"rift"));
    }

    #[test]
    fn reopening_discards_pending_writes() {
        let (loopback, probe) = LoopbackTransport::new();
        let mut transport = BufferedTransport::new(loopback);
        transport.open().expect("open");
        transport.write_all(b"stale").expect("write");
        transport.close().expect("close");
        transport.open().expect("reopen");
        transport.flush().expect("flush");
        assert!(probe.written().is_empty());
    }

    #[test]
    fn describes_layer_stack() {
        let (loopback, _) = LoopbackTransport::new();
        assert_eq!(BufferedTransport::new(loopback).describe(), "buffered>loopback");
    }
}

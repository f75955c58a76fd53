//! zlib compression layer.
//!
//! Writes are compressed on flush with a sync flush so the peer can decode
//! each message as soon as it arrives. Compression state is reset whenever
//! the transport is opened.

use std::io::{self, Read, Write};

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use tether_config::Endpoint;

use super::Transport;
use crate::error::TransportError;

const CHUNK_SIZE: usize = 4096;

/// Compresses writes and decompresses reads of the inner transport.
pub struct ZlibTransport<T> {
    inner: T,
    level: Compression,
    compressor: Compress,
    decompressor: Decompress,
    write_buffer: Vec<u8>,
    read_buffer: Vec<u8>,
    read_pos: usize,
}

impl<T: Transport> ZlibTransport<T> {
    /// Wraps `inner` at the highest compression level.
    #[must_use]
    pub fn new(inner: T) -> Self {
        Self::with_level(Compression::best(), inner)
    }

    /// Wraps `inner` at `level`.
    #[must_use]
    pub fn with_level(level: Compression, inner: T) -> Self {
        Self {
            inner,
            level,
            compressor: Compress::new(level, true),
            decompressor: Decompress::new(true),
            write_buffer: Vec::new(),
            read_buffer: Vec::new(),
            read_pos: 0,
        }
    }

    /// Inner transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    fn reset(&mut self) {
        self.compressor = Compress::new(self.level, true);
        self.decompressor.reset(true);
        self.write_buffer.clear();
        self.read_buffer.clear();
        self.read_pos = 0;
    }

    fn compress_pending(&mut self) -> io::Result<Vec<u8>> {
        let mut output = Vec::with_capacity(CHUNK_SIZE);
        let mut input = self.write_buffer.as_slice();
        loop {
            output.reserve(CHUNK_SIZE);
            let before_in = self.compressor.total_in();
            let before_out = self.compressor.total_out();
            self.compressor
                .compress_vec(input, &mut output, FlushCompress::Sync)
                .map_err(io::Error::other)?;
            let consumed = consumed_since(before_in, self.compressor.total_in());
            let produced = self.compressor.total_out() - before_out;
            input = input.get(consumed..).unwrap_or_default();
            let finished = input.is_empty() && output.len() < output.capacity();
            if finished || (consumed == 0 && produced == 0) {
                break;
            }
        }
        self.write_buffer.clear();
        Ok(output)
    }

    fn fill(&mut self) -> io::Result<usize> {
        let mut chunk = [0_u8; CHUNK_SIZE];
        loop {
            let read = self.inner.read(&mut chunk)?;
            if read == 0 {
                return Ok(0);
            }
            self.read_buffer.clear();
            self.read_pos = 0;
            let mut input = chunk.get(..read).unwrap_or_default();
            loop {
                self.read_buffer.reserve(CHUNK_SIZE);
                let before_in = self.decompressor.total_in();
                let before_out = self.decompressor.total_out();
                let status = self
                    .decompressor
                    .decompress_vec(input, &mut self.read_buffer, FlushDecompress::None)
                    .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
                let consumed = consumed_since(before_in, self.decompressor.total_in());
                let produced = self.decompressor.total_out() - before_out;
                input = input.get(consumed..).unwrap_or_default();
                let drained = input.is_empty() && self.read_buffer.len() < self.read_buffer.capacity();
                if status == Status::StreamEnd || drained || (consumed == 0 && produced == 0) {
                    break;
                }
            }
            if !self.read_buffer.is_empty() {
                return Ok(self.read_buffer.len());
            }
        }
    }
}

fn consumed_since(before: u64, after: u64) -> usize {
    usize::try_from(after - before).unwrap_or(usize::MAX)
}

impl<T: Transport> Transport for ZlibTransport<T> {
    fn open(&mut self) -> Result<(), TransportError> {
        self.inner.open()?;
        self.reset();
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.reset();
        self.inner.close()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn endpoint(&self) -> &Endpoint {
        self.inner.endpoint()
    }

    fn describe(&self) -> String {
        format!("zlib>{}", self.inner.describe())
    }
}

impl<T: Transport> Read for ZlibTransport<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.read_pos >= self.read_buffer.len() && self.fill()? == 0 {
            return Ok(0);
        }
        let available = self.read_buffer.get(self.read_pos..).unwrap_or_default();
        let count = available.len().min(buf.len());
        if let (Some(target), Some(source)) = (buf.get_mut(..count), available.get(..count)) {
            target.copy_from_slice(source);
        }
        self.read_pos += count;
        Ok(count)
    }
}

impl<T: Transport> Write for ZlibTransport<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.write_buffer.is_empty() {
            let compressed = self.compress_pending()?;
            self.inner.write_all(&compressed)?;
        }
        self.inner.flush()
    }
}

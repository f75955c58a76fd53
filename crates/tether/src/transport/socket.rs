//! Plain TCP and filesystem socket transport.

use std::io::{self, Read, Write};
use std::time::Duration;

use tether_config::{ConnectionDescriptor, Endpoint};
use tracing::debug;

use super::stream::SocketStream;
use super::{TRANSPORT_TARGET, Transport, address_of};
use crate::error::TransportError;

/// Unencrypted socket transport for `tcp` and `unix` URIs.
pub struct SocketTransport {
    endpoint: Endpoint,
    address: String,
    timeout: Option<Duration>,
    stream: Option<SocketStream>,
}

impl SocketTransport {
    /// Closed transport targeting the descriptor's endpoint.
    #[must_use]
    pub fn new(descriptor: &ConnectionDescriptor, timeout: Option<Duration>) -> Self {
        Self {
            endpoint: descriptor.endpoint().clone(),
            address: address_of(descriptor),
            timeout,
            stream: None,
        }
    }

    /// Socket timeout applied on open.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn stream_mut(&mut self) -> io::Result<&mut SocketStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is not open"))
    }
}

impl Transport for SocketTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Err(TransportError::AlreadyOpen {
                address: self.address.clone(),
            });
        }
        let stream = SocketStream::connect(&self.endpoint, self.timeout).map_err(|source| {
            TransportError::Connect {
                address: self.address.clone(),
                source,
            }
        })?;
        debug!(target: TRANSPORT_TARGET, address = %self.address, "socket connected");
        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let Some(stream) = self.stream.take() else {
            return Err(TransportError::NotOpen {
                address: self.address.clone(),
            });
        };
        stream.shutdown().map_err(|source| TransportError::Close {
            address: self.address.clone(),
            source,
        })
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn describe(&self) -> String {
        match self.endpoint {
            Endpoint::Unix { .. } => String::from("unix"),
            _ => String::from("tcp"),
        }
    }
}

impl Read for SocketTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream_mut()?.read(buf)
    }
}

impl Write for SocketTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream_mut()?.flush()
    }
}

//! Base transport selection by scheme.

use std::io::{self, Read, Write};
use std::time::Duration;

use tether_config::{ConnectionDescriptor, Endpoint, Scheme};

use super::{HttpTransport, SocketTransport, TlsSocketTransport, Transport};
use crate::error::{CertificateError, TransportError};

/// The transport a scheme maps to, before any decorating layers.
pub enum BaseTransport {
    /// `tcp`
    Tcp(SocketTransport),
    /// `tcps`
    TlsTcp(TlsSocketTransport),
    /// `http` and `https`
    Http(HttpTransport),
    /// `unix`
    Unix(SocketTransport),
    /// `unixs`
    TlsUnix(TlsSocketTransport),
}

impl BaseTransport {
    /// Selects and constructs the base transport for `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError`] when a TLS scheme's CA material cannot be
    /// loaded.
    pub fn for_descriptor(
        descriptor: &ConnectionDescriptor,
        timeout: Option<Duration>,
    ) -> Result<Self, CertificateError> {
        Ok(match descriptor.scheme() {
            Scheme::Tcp => Self::Tcp(SocketTransport::new(descriptor, timeout)),
            Scheme::Tcps => Self::TlsTcp(TlsSocketTransport::new(descriptor, timeout)?),
            Scheme::Http | Scheme::Https => Self::Http(HttpTransport::new(descriptor, timeout)),
            Scheme::Unix => Self::Unix(SocketTransport::new(descriptor, timeout)),
            Scheme::Unixs => Self::TlsUnix(TlsSocketTransport::new(descriptor, timeout)?),
        })
    }

    fn as_transport(&self) -> &dyn Transport {
        match self {
            Self::Tcp(transport) | Self::Unix(transport) => transport,
            Self::TlsTcp(transport) | Self::TlsUnix(transport) => transport,
            Self::Http(transport) => transport,
        }
    }

    fn as_transport_mut(&mut self) -> &mut dyn Transport {
        match self {
            Self::Tcp(transport) | Self::Unix(transport) => transport,
            Self::TlsTcp(transport) | Self::TlsUnix(transport) => transport,
            Self::Http(transport) => transport,
        }
    }
}

impl Transport for BaseTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        self.as_transport_mut().open()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.as_transport_mut().close()
    }

    fn is_open(&self) -> bool {
        self.as_transport().is_open()
    }

    fn endpoint(&self) -> &Endpoint {
        self.as_transport().endpoint()
    }

    fn describe(&self) -> String {
        self.as_transport().describe()
    }
}

impl Read for BaseTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.as_transport_mut().read(buf)
    }
}

impl Write for BaseTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.as_transport_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.as_transport_mut().flush()
    }
}

//! Transport layers for Thrift clients.
//!
//! A transport is built from a [`ConnectionDescriptor`] in two steps: a
//! [`BaseTransport`] is chosen by scheme, then the optional buffering and zlib
//! layers are wrapped around it, buffering innermost. The result is shared as
//! a [`TransportHandle`] between the protocol codecs and the lifecycle
//! manager.
//!
//! Base transports follow Thrift's strict state contract: opening an open
//! transport or closing a closed one is an error. The lifecycle layer is
//! responsible for turning those mismatches into no-ops.

mod base;
mod buffered;
mod builder;
mod handle;
mod http;
mod socket;
mod stream;
mod tls;
mod zlib;

#[cfg(test)]
pub(crate) mod test_support;

use std::io::{Read, Write};

pub use base::BaseTransport;
pub use buffered::{BufferedTransport, DEFAULT_BUFFER_SIZE};
pub use builder::build;
pub use handle::TransportHandle;
pub use http::HttpTransport;
pub use socket::SocketTransport;
pub use stream::DEFAULT_CONNECT_TIMEOUT;
pub use tls::TlsSocketTransport;
pub use zlib::ZlibTransport;

use tether_config::{ConnectionDescriptor, Endpoint};

use crate::error::TransportError;

pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Byte channel with an explicit open/closed state.
pub trait Transport: Read + Write + Send {
    /// Establishes the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::AlreadyOpen`] when already open, or the
    /// connection failure.
    fn open(&mut self) -> Result<(), TransportError>;

    /// Releases the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotOpen`] when already closed, or the
    /// shutdown failure. The transport is closed after either.
    fn close(&mut self) -> Result<(), TransportError>;

    /// Whether the transport currently holds a connection.
    fn is_open(&self) -> bool;

    /// Endpoint the base transport targets.
    fn endpoint(&self) -> &Endpoint;

    /// Layer stack from outermost to base, such as `zlib>buffered>tcp`.
    fn describe(&self) -> String;
}

impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    fn open(&mut self) -> Result<(), TransportError> {
        (**self).open()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn endpoint(&self) -> &Endpoint {
        (**self).endpoint()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Display form of an endpoint for errors and logs.
pub(crate) fn address_of(descriptor: &ConnectionDescriptor) -> String {
    descriptor.to_string()
}

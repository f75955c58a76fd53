//! Shared ownership of a built transport.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tether_config::Endpoint;

use super::Transport;
use crate::error::TransportError;

/// Cloneable handle to one transport instance.
///
/// The protocol codecs read and write through clones of the handle while the
/// lifecycle manager opens and closes the same instance. The lock guards each
/// call; it does not serialise units of work, which remains the host's job.
#[derive(Clone)]
pub struct TransportHandle {
    inner: Arc<Mutex<Box<dyn Transport>>>,
    endpoint: Endpoint,
    address: String,
    layers: String,
}

impl TransportHandle {
    /// Takes ownership of `transport`. `address` names the endpoint in logs
    /// and errors.
    pub fn new<T>(address: impl Into<String>, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        let endpoint = transport.endpoint().clone();
        let layers = transport.describe();
        Self {
            inner: Arc::new(Mutex::new(Box::new(transport))),
            endpoint,
            address: address.into(),
            layers,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Transport>> {
        // A panic mid-call leaves at worst a half-written frame; the
        // transport state itself stays coherent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens the transport with the strict state contract.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`TransportError`].
    pub fn open(&self) -> Result<(), TransportError> {
        self.lock().open()
    }

    /// Closes the transport with the strict state contract.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`TransportError`].
    pub fn close(&self) -> Result<(), TransportError> {
        self.lock().close()
    }

    /// Whether the transport is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lock().is_open()
    }

    /// Endpoint of the base transport.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Display form of the endpoint.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Layer stack, outermost first.
    #[must_use]
    pub fn layers(&self) -> &str {
        &self.layers
    }
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandle")
            .field("address", &self.address)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

impl Read for TransportHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.lock().read(buf)
    }
}

impl Write for TransportHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flush()
    }
}

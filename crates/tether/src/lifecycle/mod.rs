//! Request-scoped connection lifecycle.
//!
//! Three patterns share one [`Connection`]:
//!
//! - [`RequestHooks`] open before every request and close at teardown when
//!   `ALWAYS_CONNECT` is set.
//! - [`ConnectionScope`] holds the transport open for an explicit block.
//! - [`autoconnect`] wraps a callable so each invocation runs inside a scope.
//!
//! Opening an open transport and closing a closed one are no-ops here. A
//! scope only closes a transport it opened itself, so the patterns nest: a
//! scope inside a request leaves the request's connection open. Close failures
//! are reported and then dropped; the transport always ends up closed.

mod hooks;
mod scope;

use std::fmt;
use std::sync::Arc;

pub use hooks::{BeforeRequestHook, RequestHooks, RequestLifecycle, TeardownHook};
pub use scope::{ConnectionScope, autoconnect, autoconnect_with};

use crate::error::{ConnectionError, TransportError};
use crate::reporter::LifecycleReporter;
use crate::transport::TransportHandle;

/// Whether the transport is opened implicitly for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectPolicy {
    /// Open before each request and close at teardown.
    Always,
    /// Leave the transport alone unless a scope asks for it.
    OnDemand,
}

impl ConnectPolicy {
    /// Policy for the `ALWAYS_CONNECT` option.
    #[must_use]
    pub const fn from_always_connect(always_connect: bool) -> Self {
        if always_connect {
            Self::Always
        } else {
            Self::OnDemand
        }
    }

    /// True for [`ConnectPolicy::Always`].
    #[must_use]
    pub const fn is_always(self) -> bool {
        matches!(self, Self::Always)
    }
}

/// Idempotent open and close over a shared transport.
#[derive(Clone)]
pub struct Connection {
    transport: TransportHandle,
    reporter: Arc<dyn LifecycleReporter>,
}

impl Connection {
    /// Manages `transport`, reporting through `reporter`.
    pub fn new(transport: TransportHandle, reporter: Arc<dyn LifecycleReporter>) -> Self {
        Self {
            transport,
            reporter,
        }
    }

    /// Opens the transport unless it is already open.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the transport cannot be opened.
    pub fn open(&self) -> Result<(), ConnectionError> {
        if self.transport.is_open() {
            return Ok(());
        }
        let address = self.transport.address();
        self.reporter.opening(address);
        match self.transport.open() {
            Ok(()) | Err(TransportError::AlreadyOpen { .. }) => {
                self.reporter.opened(address);
                Ok(())
            }
            Err(source) => {
                let error = ConnectionError::new(address, source);
                self.reporter.open_failed(&error);
                Err(error)
            }
        }
    }

    /// Closes the transport unless it is already closed.
    ///
    /// # Errors
    ///
    /// Returns the shutdown failure. The transport is closed either way.
    pub fn close(&self) -> Result<(), TransportError> {
        if !self.transport.is_open() {
            return Ok(());
        }
        let address = self.transport.address();
        match self.transport.close() {
            Ok(()) | Err(TransportError::NotOpen { .. }) => {
                self.reporter.closed(address);
                Ok(())
            }
            Err(error) => {
                self.reporter.close_failed(address, &error);
                Err(error)
            }
        }
    }

    /// Closes and discards any failure once it has been reported.
    pub fn release(&self) {
        if let Err(error) = self.close() {
            tracing::trace!(
                target: crate::reporter::LIFECYCLE_TARGET,
                error = %error,
                "suppressed close failure"
            );
        }
    }

    /// Whether the transport is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Transport under management.
    #[must_use]
    pub const fn transport(&self) -> &TransportHandle {
        &self.transport
    }

    /// Opens the transport for the lifetime of the returned scope.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the transport cannot be opened.
    pub fn scope(&self) -> Result<ConnectionScope, ConnectionError> {
        ConnectionScope::enter(self.clone())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

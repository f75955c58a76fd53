//! Structured reporting for connection lifecycle events.

use std::sync::Arc;

use crate::error::{ConnectionError, TransportError};

pub(crate) const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Observer notified as transports are opened and closed around work.
pub trait LifecycleReporter: Send + Sync {
    /// Invoked before the transport is opened.
    fn opening(&self, address: &str);

    /// Invoked after the transport opened.
    fn opened(&self, address: &str);

    /// Invoked when opening failed.
    fn open_failed(&self, error: &ConnectionError);

    /// Invoked after the transport closed.
    fn closed(&self, address: &str);

    /// Invoked when closing reported a failure. The transport is closed
    /// regardless.
    fn close_failed(&self, address: &str, error: &TransportError);
}

impl<T> LifecycleReporter for Arc<T>
where
    T: LifecycleReporter + ?Sized,
{
    fn opening(&self, address: &str) {
        (**self).opening(address);
    }

    fn opened(&self, address: &str) {
        (**self).opened(address);
    }

    fn open_failed(&self, error: &ConnectionError) {
        (**self).open_failed(error);
    }

    fn closed(&self, address: &str) {
        (**self).closed(address);
    }

    fn close_failed(&self, address: &str, error: &TransportError) {
        (**self).close_failed(address, error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredLifecycleReporter;

impl StructuredLifecycleReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl LifecycleReporter for StructuredLifecycleReporter {
    fn opening(&self, address: &str) {
        tracing::debug!(
            target: LIFECYCLE_TARGET,
            event = "connection_opening",
            address,
            "opening thrift transport"
        );
    }

    fn opened(&self, address: &str) {
        tracing::debug!(
            target: LIFECYCLE_TARGET,
            event = "connection_opened",
            address,
            "thrift transport open"
        );
    }

    fn open_failed(&self, error: &ConnectionError) {
        tracing::error!(
            target: LIFECYCLE_TARGET,
            event = "connection_failed",
            address = error.address(),
            error = %error.transport_error(),
            "unable to connect to thrift server"
        );
    }

    fn closed(&self, address: &str) {
        tracing::debug!(
            target: LIFECYCLE_TARGET,
            event = "connection_closed",
            address,
            "thrift transport closed"
        );
    }

    fn close_failed(&self, address: &str, error: &TransportError) {
        tracing::warn!(
            target: LIFECYCLE_TARGET,
            event = "connection_close_failed",
            address,
            error = %error,
            "closing thrift transport failed"
        );
    }
}

//! Error types surfaced while building transports and managing connections.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use tether_config::ConfigurationError;

/// HTTP status a host framework should answer with when the per-request
/// connection cannot be established.
pub const CONNECTION_FAILURE_STATUS: u16 = 500;

/// Failures raised by transport `open` and `close`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// `open` was called on an open transport.
    #[error("transport to {address} is already open")]
    AlreadyOpen {
        /// Endpoint display.
        address: String,
    },
    /// `close` was called on a closed transport.
    #[error("transport to {address} is not open")]
    NotOpen {
        /// Endpoint display.
        address: String,
    },
    /// The socket could not be connected.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// Endpoint display.
        address: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The TLS handshake did not complete.
    #[error("TLS handshake with {address} failed: {source}")]
    Handshake {
        /// Endpoint display.
        address: String,
        /// Underlying failure, including certificate rejection.
        #[source]
        source: io::Error,
    },
    /// The HTTP client could not be prepared.
    #[error("failed to prepare HTTP client for {address}: {source}")]
    Http {
        /// Endpoint display.
        address: String,
        /// Underlying client failure.
        #[source]
        source: reqwest::Error,
    },
    /// Shutting the connection down failed. The transport is closed anyway.
    #[error("failed to close transport to {address}: {source}")]
    Close {
        /// Endpoint display.
        address: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// True for the open/close state mismatches that the lifecycle manager
    /// treats as no-ops.
    #[must_use]
    pub const fn is_state_mismatch(&self) -> bool {
        matches!(self, Self::AlreadyOpen { .. } | Self::NotOpen { .. })
    }
}

/// TLS material problems detected while a secure transport is built.
#[derive(Debug, Error)]
pub enum CertificateError {
    /// Validation is enabled but no CA bundle was configured.
    #[error("TLS_VALIDATE is set but TLS_CA_PATH is missing")]
    MissingCaPath,
    /// The CA bundle could not be read.
    #[error("failed to read CA bundle '{path}': {source}")]
    Unreadable {
        /// Bundle path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The CA bundle held no PEM certificates.
    #[error("CA bundle '{path}' contains no certificates")]
    NoCertificates {
        /// Bundle path.
        path: Utf8PathBuf,
    },
    /// A certificate in the bundle was rejected as a trust anchor.
    #[error("CA bundle '{path}' holds an unusable certificate: {source}")]
    Rejected {
        /// Bundle path.
        path: Utf8PathBuf,
        /// Underlying TLS failure.
        #[source]
        source: rustls::Error,
    },
    /// The host cannot be presented as a TLS server name.
    #[error("'{host}' is not a valid TLS server name")]
    ServerName {
        /// Offending host.
        host: String,
    },
    /// The TLS client configuration could not be assembled.
    #[error("failed to configure TLS client: {0}")]
    Config(#[source] rustls::Error),
}

impl From<CertificateError> for io::Error {
    fn from(error: CertificateError) -> Self {
        let kind = match &error {
            CertificateError::MissingCaPath => io::ErrorKind::NotFound,
            CertificateError::Unreadable { source, .. } => source.kind(),
            _ => io::ErrorKind::InvalidData,
        };
        Self::new(kind, error)
    }
}

/// Failures raised while a client is built from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The option mapping was malformed.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// TLS material could not be loaded.
    #[error(transparent)]
    Certificate(#[from] CertificateError),
}

/// The transport could not be opened for a unit of work.
#[derive(Debug, Error)]
#[error("unable to connect to thrift server at {address}")]
pub struct ConnectionError {
    address: String,
    #[source]
    source: TransportError,
}

impl ConnectionError {
    pub(crate) fn new(address: impl Into<String>, source: TransportError) -> Self {
        Self {
            address: address.into(),
            source,
        }
    }

    /// Endpoint the connection was attempted against.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Transport failure behind this error.
    #[must_use]
    pub const fn transport_error(&self) -> &TransportError {
        &self.source
    }

    /// Status code for the response the host should produce.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        CONNECTION_FAILURE_STATUS
    }
}

/// Outcome of a unit of work run under the request lifecycle.
#[derive(Debug, Error)]
pub enum RequestError<E> {
    /// The transport could not be opened, so the work never ran.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    /// The work itself failed.
    #[error("{0}")]
    Work(E),
}

impl<E> RequestError<E> {
    /// Status code for connection failures, `None` for work failures.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Connection(error) => Some(error.status_code()),
            Self::Work(_) => None,
        }
    }

    /// Returns the work error, if that is what failed.
    pub fn into_work(self) -> Option<E> {
        match self {
            Self::Connection(_) => None,
            Self::Work(error) => Some(error),
        }
    }
}

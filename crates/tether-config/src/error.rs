//! Construction-time configuration failures.

use thiserror::Error;

use crate::descriptor::Scheme;
use crate::protocol::ProtocolKind;

/// Errors raised while resolving configuration into a connection descriptor or
/// protocol selection.
///
/// These are always fatal: they surface while the client is being built and
/// never mid-request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// `TRANSPORT_URI` was not supplied.
    #[error("TRANSPORT_URI must be specified")]
    MissingTransport,
    /// `TRANSPORT_URI` was supplied but blank.
    #[error("TRANSPORT_URI must not be empty")]
    EmptyTransport,
    /// The URI carried no `scheme:` prefix.
    #[error("invalid configuration for TRANSPORT_URI: '{0}' has no scheme")]
    MissingScheme(String),
    /// The scheme token is not one of the supported transports.
    #[error("invalid configuration for TRANSPORT_URI: {0}")]
    UnsupportedScheme(String),
    /// A socket-file scheme carried an authority component.
    #[error("{scheme} socket must start with either {scheme}:/ or {scheme}:///, got '{uri}'")]
    SocketHost {
        /// Scheme that forbids a host.
        scheme: Scheme,
        /// Offending URI.
        uri: String,
    },
    /// A network scheme was missing its host.
    #[error("missing host in '{0}'")]
    MissingHost(String),
    /// A socket-file scheme was missing its path.
    #[error("missing socket path in '{0}'")]
    MissingSocketPath(String),
    /// A socket-file path was not absolute.
    #[error("socket path in '{0}' must be absolute")]
    RelativeSocketPath(String),
    /// The URI failed to parse.
    #[error("invalid transport URI '{uri}': {source}")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The protocol name is not recognised.
    #[error("invalid configuration for PROTOCOL_NAME: {0}")]
    UnknownProtocol(String),
    /// The protocol is recognised but no codec is compiled in for it.
    #[error("protocol {0} is not supported by this build")]
    UnsupportedProtocol(ProtocolKind),
    /// An option carried a value of the wrong shape.
    #[error("invalid value '{value}' for {key}: expected {expected}")]
    InvalidValue {
        /// Option name.
        key: String,
        /// Rejected value.
        value: String,
        /// Human readable description of the accepted values.
        expected: &'static str,
    },
}

//! Connection descriptors parsed from transport URIs.
//!
//! A descriptor is the normalised view of `TRANSPORT_URI` plus the TLS
//! options. Scheme dispatch happens on the raw token before URL
//! normalisation, so `TCP://host` is rejected rather than silently lowercased.

use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use crate::defaults::DEFAULT_TCP_PORT;
use crate::error::ConfigurationError;

/// Transport schemes accepted in `TRANSPORT_URI`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Scheme {
    /// Plain TCP socket.
    Tcp,
    /// TLS over TCP.
    Tcps,
    /// Thrift over HTTP.
    Http,
    /// Thrift over HTTPS.
    Https,
    /// Unix domain socket.
    Unix,
    /// TLS over a Unix domain socket.
    Unixs,
}

impl Scheme {
    /// Returns true when the scheme wraps its socket in TLS via the TLS options.
    #[must_use]
    pub const fn is_tls_socket(self) -> bool {
        matches!(self, Self::Tcps | Self::Unixs)
    }

    /// Returns true for schemes addressed by a filesystem path.
    #[must_use]
    pub const fn is_socket_file(self) -> bool {
        matches!(self, Self::Unix | Self::Unixs)
    }
}

/// Where a transport connects to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Endpoint {
    /// TCP host and port, used by `tcp` and `tcps`.
    Tcp {
        /// Host name or address literal without IPv6 brackets.
        host: String,
        /// Port, defaulted to 9090 when the URI omits it.
        port: u16,
    },
    /// HTTP endpoint, used by `http` and `https`.
    Http {
        /// Full request URL.
        url: Url,
        /// Host component.
        host: String,
        /// Explicit port or the scheme's well-known port.
        port: u16,
        /// Request path.
        path: String,
    },
    /// Filesystem socket, used by `unix` and `unixs`.
    Unix {
        /// Socket path.
        path: Utf8PathBuf,
    },
}

impl Endpoint {
    /// Host component for network endpoints.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        match self {
            Self::Tcp { host, .. } | Self::Http { host, .. } => Some(host),
            Self::Unix { .. } => None,
        }
    }

    /// Port for network endpoints.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        match self {
            Self::Tcp { port, .. } | Self::Http { port, .. } => Some(*port),
            Self::Unix { .. } => None,
        }
    }

    /// HTTP request path or socket filesystem path.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Tcp { .. } => None,
            Self::Http { path, .. } => Some(path),
            Self::Unix { path } => Some(path.as_str()),
        }
    }

    /// Socket filesystem path for Unix endpoints.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path),
            Self::Tcp { .. } | Self::Http { .. } => None,
        }
    }
}

/// Certificate handling for `tcps` and `unixs`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsOptions {
    /// Whether the peer certificate must chain to the configured CA bundle.
    pub validate: bool,
    /// PEM bundle of trusted certificate authorities.
    pub ca_path: Option<Utf8PathBuf>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            validate: true,
            ca_path: None,
        }
    }
}

/// Normalised connection target derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionDescriptor {
    scheme: Scheme,
    endpoint: Endpoint,
    tls: TlsOptions,
}

impl ConnectionDescriptor {
    /// Parses a transport URI.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the URI is blank, has no recognised
    /// scheme, misses a required host, or carries a host on a socket-file
    /// scheme.
    pub fn parse(input: &str, tls: TlsOptions) -> Result<Self, ConfigurationError> {
        if input.trim().is_empty() {
            return Err(ConfigurationError::EmptyTransport);
        }

        let Some((token, _)) = input.split_once(':') else {
            return Err(ConfigurationError::MissingScheme(input.to_owned()));
        };
        if token.is_empty() {
            return Err(ConfigurationError::MissingScheme(input.to_owned()));
        }
        let scheme = Scheme::from_str(token)
            .map_err(|_| ConfigurationError::UnsupportedScheme(input.to_owned()))?;

        let url = Url::parse(input).map_err(|source| ConfigurationError::InvalidUri {
            uri: input.to_owned(),
            source,
        })?;

        let endpoint = match scheme {
            Scheme::Tcp | Scheme::Tcps => Endpoint::Tcp {
                host: required_host(&url, input)?,
                port: url.port().unwrap_or(DEFAULT_TCP_PORT),
            },
            Scheme::Http | Scheme::Https => {
                let host = required_host(&url, input)?;
                let port = url
                    .port_or_known_default()
                    .ok_or_else(|| ConfigurationError::MissingHost(input.to_owned()))?;
                Endpoint::Http {
                    host,
                    port,
                    path: url.path().to_owned(),
                    url,
                }
            }
            Scheme::Unix | Scheme::Unixs => Endpoint::Unix {
                path: socket_path(scheme, &url, input)?,
            },
        };

        Ok(Self {
            scheme,
            endpoint,
            tls,
        })
    }

    /// Transport scheme.
    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Resolved endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// TLS options; only consulted for `tcps` and `unixs`.
    #[must_use]
    pub const fn tls(&self) -> &TlsOptions {
        &self.tls
    }

    /// Host component, when the scheme is network based.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.endpoint.host()
    }

    /// Port, when the scheme is network based.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.endpoint.port()
    }

    /// HTTP path or socket path.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.endpoint.path()
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.endpoint {
            Endpoint::Tcp { host, port } if host.contains(':') => {
                write!(formatter, "{}://[{host}]:{port}", self.scheme)
            }
            Endpoint::Tcp { host, port } => write!(formatter, "{}://{host}:{port}", self.scheme),
            Endpoint::Http { url, .. } => write!(formatter, "{url}"),
            Endpoint::Unix { path } => write!(formatter, "{}://{path}", self.scheme),
        }
    }
}

fn authority(url: &Url) -> Option<&str> {
    url.host_str().filter(|host| !host.is_empty())
}

fn required_host(url: &Url, input: &str) -> Result<String, ConfigurationError> {
    let host = authority(url).ok_or_else(|| ConfigurationError::MissingHost(input.to_owned()))?;
    Ok(host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_owned())
}

fn socket_path(
    scheme: Scheme,
    url: &Url,
    input: &str,
) -> Result<Utf8PathBuf, ConfigurationError> {
    if authority(url).is_some() || url.port().is_some() {
        return Err(ConfigurationError::SocketHost {
            scheme,
            uri: input.to_owned(),
        });
    }

    // The path is taken verbatim from the URI: `%20` names a file containing
    // `%20`, not a space.
    let rest = input.split_once(':').map_or("", |(_, rest)| rest);
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split(['?', '#']).next().unwrap_or_default();
    if path.is_empty() {
        return Err(ConfigurationError::MissingSocketPath(input.to_owned()));
    }
    if !path.starts_with('/') {
        return Err(ConfigurationError::RelativeSocketPath(input.to_owned()));
    }
    Ok(Utf8PathBuf::from(path))
}

//! TLS over TCP and filesystem sockets.
//!
//! CA material is loaded when the transport is built so misconfiguration
//! fails at construction rather than on the first request. The handshake
//! completes inside [`Transport::open`].

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8Path;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    ClientConfig, ClientConnection, DigitallySignedStruct, RootCertStore, SignatureScheme,
    StreamOwned,
};
use tether_config::{ConnectionDescriptor, Endpoint, TlsOptions};
use tracing::{debug, warn};

use super::stream::SocketStream;
use super::{TRANSPORT_TARGET, Transport, address_of};
use crate::error::{CertificateError, TransportError};

/// Server name presented for filesystem sockets, which carry no host.
pub const SOCKET_FILE_SERVER_NAME: &str = "localhost";

type TlsStream = StreamOwned<ClientConnection, SocketStream>;

/// Encrypted socket transport for `tcps` and `unixs` URIs.
pub struct TlsSocketTransport {
    endpoint: Endpoint,
    address: String,
    timeout: Option<Duration>,
    config: Arc<ClientConfig>,
    server_name: ServerName<'static>,
    stream: Option<TlsStream>,
}

impl TlsSocketTransport {
    /// Closed transport with TLS settings resolved from the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError`] when validation is enabled and the CA
    /// bundle is missing, unreadable, or empty.
    pub fn new(
        descriptor: &ConnectionDescriptor,
        timeout: Option<Duration>,
    ) -> Result<Self, CertificateError> {
        let endpoint = descriptor.endpoint().clone();
        let server_name = server_name_for(&endpoint)?;
        let config = client_config(descriptor.tls())?;
        Ok(Self {
            endpoint,
            address: address_of(descriptor),
            timeout,
            config,
            server_name,
            stream: None,
        })
    }

    fn stream_mut(&mut self) -> io::Result<&mut TlsStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is not open"))
    }

    fn handshake(&self) -> Result<TlsStream, TransportError> {
        let mut socket = SocketStream::connect(&self.endpoint, self.timeout).map_err(|source| {
            TransportError::Connect {
                address: self.address.clone(),
                source,
            }
        })?;
        let handshake_error = |source: io::Error| TransportError::Handshake {
            address: self.address.clone(),
            source,
        };
        let mut connection =
            ClientConnection::new(Arc::clone(&self.config), self.server_name.clone())
                .map_err(|error| handshake_error(io::Error::other(error)))?;
        while connection.is_handshaking() {
            connection
                .complete_io(&mut socket)
                .map_err(handshake_error)?;
        }
        Ok(StreamOwned::new(connection, socket))
    }
}

impl Transport for TlsSocketTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Err(TransportError::AlreadyOpen {
                address: self.address.clone(),
            });
        }
        let stream = self.handshake()?;
        debug!(
            target: TRANSPORT_TARGET,
            address = %self.address,
            protocol = ?stream.conn.protocol_version(),
            "TLS session established"
        );
        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let Some(mut stream) = self.stream.take() else {
            return Err(TransportError::NotOpen {
                address: self.address.clone(),
            });
        };
        stream.conn.send_close_notify();
        let notified = flush_tls(&mut stream);
        let shutdown = stream.sock.shutdown();
        notified
            .and(shutdown)
            .map_err(|source| TransportError::Close {
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
            Endpoint::Unix { .. } => String::from("unixs"),
            _ => String::from("tcps"),
        }
    }
}

impl Read for TlsSocketTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream_mut()?.read(buf)
    }
}

impl Write for TlsSocketTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream_mut()?.flush()
    }
}

fn flush_tls(stream: &mut TlsStream) -> io::Result<()> {
    while stream.conn.wants_write() {
        stream.conn.write_tls(&mut stream.sock)?;
    }
    stream.sock.flush()
}

fn server_name_for(endpoint: &Endpoint) -> Result<ServerName<'static>, CertificateError> {
    let host = match endpoint {
        Endpoint::Tcp { host, .. } | Endpoint::Http { host, .. } => host.as_str(),
        Endpoint::Unix { .. } => SOCKET_FILE_SERVER_NAME,
    };
    ServerName::try_from(host.to_owned()).map_err(|_| CertificateError::ServerName {
        host: host.to_owned(),
    })
}

/// Builds the rustls client configuration for the given options.
///
/// With validation on, the CA bundle becomes the only trust root. With it
/// off, any certificate chain is accepted but handshake signatures are still
/// checked.
pub(crate) fn client_config(tls: &TlsOptions) -> Result<Arc<ClientConfig>, CertificateError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(CertificateError::Config)?;

    let config = if tls.validate {
        let path = tls
            .ca_path
            .as_deref()
            .ok_or(CertificateError::MissingCaPath)?;
        builder
            .with_root_certificates(load_roots(path)?)
            .with_no_client_auth()
    } else {
        warn!(
            target: TRANSPORT_TARGET,
            "TLS certificate validation is disabled"
        );
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
            .with_no_client_auth()
    };
    Ok(Arc::new(config))
}

fn load_roots(path: &Utf8Path) -> Result<RootCertStore, CertificateError> {
    let unreadable = |source| CertificateError::Unreadable {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = BufReader::new(File::open(path).map_err(unreadable)?);
    let mut roots = RootCertStore::empty();
    for certificate in rustls_pemfile::certs(&mut reader) {
        roots
            .add(certificate.map_err(unreadable)?)
            .map_err(|source| CertificateError::Rejected {
                path: path.to_path_buf(),
                source,
            })?;
    }
    if roots.is_empty() {
        return Err(CertificateError::NoCertificates {
            path: path.to_path_buf(),
        });
    }
    debug!(
        target: TRANSPORT_TARGET,
        ca_path = %path,
        roots = roots.len(),
        "loaded CA bundle"
    );
    Ok(roots)
}

#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

//! One-stop client bound to a host's request lifecycle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tether_config::{Config, ConnectionDescriptor, ProtocolKind};
use tracing::info;

use crate::client::make_client;
use crate::error::{BuildError, ConnectionError};
use crate::lifecycle::{
    ConnectPolicy, Connection, ConnectionScope, RequestHooks, RequestLifecycle, autoconnect,
};
use crate::protocol::{InputProtocol, OutputProtocol, compose_kind};
use crate::reporter::{LIFECYCLE_TARGET, LifecycleReporter, StructuredLifecycleReporter};
use crate::transport::{self, TransportHandle};

/// A generated client together with the transport it talks over and the
/// lifecycle that opens and closes that transport.
///
/// Build one per host application and share it; the transport is one shared
/// instance, so concurrent requests must be serialised by the host.
pub struct ThriftClient<C> {
    client: Mutex<C>,
    connection: Connection,
    descriptor: ConnectionDescriptor,
    protocol: ProtocolKind,
    policy: ConnectPolicy,
}

impl<C> ThriftClient<C> {
    /// Builds the transport, protocol, and client described by `config`.
    ///
    /// Nothing is opened; the first connection happens per request.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] for malformed options or unusable TLS material.
    pub fn new<F>(interface: F, config: &Config) -> Result<Self, BuildError>
    where
        F: FnOnce(InputProtocol, OutputProtocol) -> C,
    {
        Self::with_reporter(interface, config, Arc::new(StructuredLifecycleReporter::new()))
    }

    /// [`ThriftClient::new`] with a custom lifecycle reporter.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] for malformed options or unusable TLS material.
    pub fn with_reporter<F>(
        interface: F,
        config: &Config,
        reporter: Arc<dyn LifecycleReporter>,
    ) -> Result<Self, BuildError>
    where
        F: FnOnce(InputProtocol, OutputProtocol) -> C,
    {
        let descriptor = config.descriptor()?;
        let protocol = config.protocol_kind()?;
        let transport = transport::build(&descriptor, config)?;
        let codec = compose_kind(&transport, protocol)?;
        let client = make_client(interface, codec);
        let policy = ConnectPolicy::from_always_connect(config.always_connect);
        info!(
            target: LIFECYCLE_TARGET,
            event = "client_built",
            address = %descriptor,
            layers = %transport.layers(),
            protocol = %protocol,
            always_connect = policy.is_always(),
            "thrift client ready"
        );
        Ok(Self {
            client: Mutex::new(client),
            connection: Connection::new(transport, reporter),
            descriptor,
            protocol,
            policy,
        })
    }

    /// Exclusive access to the generated client.
    pub fn client(&self) -> MutexGuard<'_, C> {
        self.client.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The shared transport.
    #[must_use]
    pub const fn transport(&self) -> &TransportHandle {
        self.connection.transport()
    }

    /// Idempotent open/close over the transport.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Resolved connection descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// Resolved wire protocol.
    #[must_use]
    pub const fn protocol_kind(&self) -> ProtocolKind {
        self.protocol
    }

    /// Whether requests connect implicitly.
    #[must_use]
    pub const fn policy(&self) -> ConnectPolicy {
        self.policy
    }

    /// Per-request hooks following the configured policy.
    #[must_use]
    pub fn request_hooks(&self) -> RequestHooks {
        RequestHooks::new(self.connection.clone(), self.policy)
    }

    /// Registers the per-request hooks with `host` when `ALWAYS_CONNECT` is
    /// set. Returns whether anything was registered.
    pub fn install<H>(&self, host: &mut H) -> bool
    where
        H: RequestLifecycle + ?Sized,
    {
        self.request_hooks().install(host)
    }

    /// Opens the transport until the returned scope is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the transport cannot be opened.
    pub fn connect(&self) -> Result<ConnectionScope, ConnectionError> {
        self.connection.scope()
    }

    /// Runs `work` against the client inside a connection scope.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the transport cannot be opened.
    pub fn with_connection<R>(&self, work: impl FnOnce(&mut C) -> R) -> Result<R, ConnectionError> {
        let _scope = self.connect()?;
        let mut client = self.client();
        Ok(work(&mut *client))
    }

    /// Wraps `work` so every call runs inside a connection scope.
    pub fn autoconnect<F, R>(&self, work: F) -> impl FnMut() -> Result<R, ConnectionError> + use<C, F, R>
    where
        F: FnMut() -> R,
    {
        autoconnect(self.connection.clone(), work)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_config::ConfigurationError;

    use crate::error::CertificateError;

    struct StubClient;

    fn stub(_: InputProtocol, _: OutputProtocol) -> StubClient {
        StubClient
    }

    #[test]
    fn missing_transport_fails_to_build() {
        let error = ThriftClient::new(stub, &Config::default()).err();
        assert!(matches!(
            error,
            Some(BuildError::Configuration(ConfigurationError::MissingTransport))
        ));
    }

    #[test]
    fn unsupported_protocol_fails_to_build() {
        let mut config = Config::for_transport("tcp://localhost");
        config.protocol_name = String::from("JSON");
        assert!(matches!(
            ThriftClient::new(stub, &config).err(),
            Some(BuildError::Configuration(ConfigurationError::UnsupportedProtocol(
                ProtocolKind::Json
            )))
        ));
    }

    #[test]
    fn tls_without_ca_fails_to_build() {
        let config = Config::for_transport("unixs:///tmp/thrift.sock");
        assert!(matches!(
            ThriftClient::new(stub, &config).err(),
            Some(BuildError::Certificate(CertificateError::MissingCaPath))
        ));
    }

    #[test]
    fn built_client_starts_closed() {
        let mut config = Config::for_transport("tcp://localhost");
        config.always_connect = false;
        let client = ThriftClient::new(stub, &config).expect("build");

        assert!(!client.transport().is_open());
        assert_eq!(client.protocol_kind(), ProtocolKind::Binary);
        assert_eq!(client.policy(), ConnectPolicy::OnDemand);
        assert_eq!(client.descriptor().port(), Some(9090));
    }
}

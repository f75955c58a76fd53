//! Thrift client transports bound to a host's request lifecycle.
//!
//! A [`Config`](tether_config::Config) names a transport URI, a wire protocol,
//! and a handful of toggles. [`ThriftClient::new`] resolves it into a base
//! transport (`tcp`, `tcps`, `http`, `https`, `unix`, or `unixs`), wraps it in
//! the optional buffering and zlib layers, composes the binary or compact
//! protocol over it, and hands both protocol halves to a generated client
//! constructor. Nothing touches the network until a request needs it.
//!
//! Connections are request scoped. With `ALWAYS_CONNECT` set, the hooks
//! installed through [`ThriftClient::install`] open the transport before each
//! request and close it at teardown; a failed open aborts the request with
//! status 500. Explicit [`ConnectionScope`]s and [`autoconnect`] wrappers
//! cover work that runs outside the host's request cycle.

mod client;
mod error;
pub mod lifecycle;
pub mod protocol;
mod reporter;
pub mod telemetry;
mod thrift_client;
pub mod transport;

pub use client::make_client;
pub use error::{
    BuildError, CONNECTION_FAILURE_STATUS, CertificateError, ConnectionError, RequestError,
    TransportError,
};
pub use lifecycle::{
    BeforeRequestHook, ConnectPolicy, Connection, ConnectionScope, RequestHooks,
    RequestLifecycle, TeardownHook, autoconnect, autoconnect_with,
};
pub use protocol::{InputProtocol, OutputProtocol, Protocol};
pub use reporter::{LifecycleReporter, StructuredLifecycleReporter};
pub use telemetry::{SubscriberOwner, TelemetryError, TelemetryHandle};
pub use thrift_client::ThriftClient;
pub use transport::{Transport, TransportHandle};

#[cfg(test)]
mod tests;

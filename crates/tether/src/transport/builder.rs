//! Transport assembly from configuration.

use tether_config::{Config, ConnectionDescriptor};
use tracing::debug;

use super::{
    BaseTransport, BufferedTransport, TRANSPORT_TARGET, Transport, TransportHandle, ZlibTransport,
    address_of,
};
use crate::error::CertificateError;

/// Builds the closed transport described by `descriptor`, wrapped in the
/// layers `config` enables. Buffering sits inside compression.
///
/// # Errors
///
/// Returns [`CertificateError`] when a TLS scheme's CA material cannot be
/// loaded.
pub fn build(
    descriptor: &ConnectionDescriptor,
    config: &Config,
) -> Result<TransportHandle, CertificateError> {
    let mut transport: Box<dyn Transport> = Box::new(BaseTransport::for_descriptor(
        descriptor,
        config.socket_timeout(),
    )?);
    if config.buffered {
        transport = Box::new(BufferedTransport::new(transport));
    }
    if config.compressed {
        transport = Box::new(ZlibTransport::new(transport));
    }
    let handle = TransportHandle::new(address_of(descriptor), transport);
    debug!(
        target: TRANSPORT_TARGET,
        address = %handle.address(),
        layers = %handle.layers(),
        "built transport"
    );
    Ok(handle)
}

//! Wire protocol codecs over a shared transport.

use thrift::protocol::{
    TBinaryInputProtocol, TBinaryOutputProtocol, TCompactInputProtocol, TCompactOutputProtocol,
    TInputProtocol, TOutputProtocol,
};

use tether_config::{ConfigurationError, ProtocolKind};

use crate::transport::TransportHandle;

/// Decoding half handed to generated clients.
pub type InputProtocol = Box<dyn TInputProtocol + Send>;

/// Encoding half handed to generated clients.
pub type OutputProtocol = Box<dyn TOutputProtocol + Send>;

/// A codec pair bound to one transport.
pub struct Protocol {
    kind: ProtocolKind,
    input: InputProtocol,
    output: OutputProtocol,
}

impl Protocol {
    /// Selected protocol.
    #[must_use]
    pub const fn kind(&self) -> ProtocolKind {
        self.kind
    }

    /// Decoding half.
    pub fn input(&mut self) -> &mut InputProtocol {
        &mut self.input
    }

    /// Encoding half.
    pub fn output(&mut self) -> &mut OutputProtocol {
        &mut self.output
    }

    /// Splits into the halves generated clients are constructed from.
    #[must_use]
    pub fn into_parts(self) -> (InputProtocol, OutputProtocol) {
        (self.input, self.output)
    }
}

/// Resolves `name` and wraps `transport` in that protocol.
///
/// # Errors
///
/// Returns [`ConfigurationError::UnknownProtocol`] for unrecognised names and
/// [`ConfigurationError::UnsupportedProtocol`] for protocols without a codec.
pub fn compose(transport: &TransportHandle, name: &str) -> Result<Protocol, ConfigurationError> {
    compose_kind(transport, ProtocolKind::resolve(name)?)
}

/// Wraps `transport` in `kind`.
///
/// # Errors
///
/// Returns [`ConfigurationError::UnsupportedProtocol`] for protocols without a
/// codec.
pub fn compose_kind(
    transport: &TransportHandle,
    kind: ProtocolKind,
) -> Result<Protocol, ConfigurationError> {
    let (input, output): (InputProtocol, OutputProtocol) = match kind {
        ProtocolKind::Binary => (
            Box::new(TBinaryInputProtocol::new(transport.clone(), true)),
            Box::new(TBinaryOutputProtocol::new(transport.clone(), true)),
        ),
        ProtocolKind::Compact => (
            Box::new(TCompactInputProtocol::new(transport.clone())),
            Box::new(TCompactOutputProtocol::new(transport.clone())),
        ),
        ProtocolKind::Json => return Err(ConfigurationError::UnsupportedProtocol(kind)),
    };
    Ok(Protocol {
        kind,
        input,
        output,
    })
}

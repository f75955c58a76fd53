//! Construction of generated service clients.

use crate::protocol::{InputProtocol, OutputProtocol, Protocol};

/// Instantiates a generated client over a composed protocol.
///
/// `interface` is the generated client's constructor, typically
/// `SomeServiceSyncClient::new`. Construction performs no I/O.
pub fn make_client<C, F>(interface: F, protocol: Protocol) -> C
where
    F: FnOnce(InputProtocol, OutputProtocol) -> C,
{
    let (input, output) = protocol.into_parts();
    interface(input, output)
}

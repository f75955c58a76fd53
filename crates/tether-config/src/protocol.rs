//! Wire protocol names accepted in `PROTOCOL_NAME`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConfigurationError;

/// Thrift wire protocols a transport can be wrapped in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ProtocolKind {
    /// Thrift binary protocol.
    #[default]
    Binary,
    /// Thrift compact protocol.
    Compact,
    /// Thrift JSON protocol.
    Json,
}

impl ProtocolKind {
    /// Protocols with a codec compiled into this build.
    pub const AVAILABLE: &'static [Self] = &[Self::Binary, Self::Compact];

    /// Returns true when a codec for the protocol is compiled in.
    #[must_use]
    pub fn is_available(self) -> bool {
        Self::AVAILABLE.contains(&self)
    }

    /// Resolves a configured protocol name.
    ///
    /// Names are matched exactly. A recognised name without a compiled codec
    /// is reported separately from an unknown one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownProtocol`] for unrecognised names
    /// and [`ConfigurationError::UnsupportedProtocol`] for recognised names
    /// this build cannot encode.
    pub fn resolve(name: &str) -> Result<Self, ConfigurationError> {
        let kind = Self::from_str(name)
            .map_err(|_| ConfigurationError::UnknownProtocol(name.to_owned()))?;
        if kind.is_available() {
            Ok(kind)
        } else {
            Err(ConfigurationError::UnsupportedProtocol(kind))
        }
    }
}

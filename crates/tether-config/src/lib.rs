//! Configuration for binding a Thrift client to a request lifecycle.
//!
//! [`Config`] is the option mapping supplied once when the client is built.
//! It resolves into a [`ConnectionDescriptor`] (which transport to build and
//! where it points) and a [`ProtocolKind`] (which codec wraps it). Nothing in
//! this crate touches the network.
//!
//! Standalone processes load it through `ortho_config`: defaults, then a TOML
//! file (`--config-path` or `TETHER_CONFIG_PATH`), then `TETHER_`-prefixed
//! environment variables, then command-line flags. Embedding hosts that keep
//! their own settings dictionary hand it over with [`Config::from_pairs`].

mod defaults;
mod descriptor;
mod error;
mod loader;
mod logging;
mod protocol;

use std::str::FromStr;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use strum::EnumString;

pub use defaults::{
    DEFAULT_HTTP_PORT, DEFAULT_HTTPS_PORT, DEFAULT_LOG_FILTER, DEFAULT_PROTOCOL, DEFAULT_TCP_PORT,
    default_log_filter, default_log_filter_string, default_log_format, default_protocol_name,
};
pub use descriptor::{ConnectionDescriptor, Endpoint, Scheme, TlsOptions};
pub use error::ConfigurationError;
pub use loader::{ArgsConfigLoader, ConfigLoader};
pub use logging::{LogFormat, LogFormatParseError, LogSettings};
pub use protocol::ProtocolKind;

/// Option names recognised in a host framework's configuration dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigKey {
    /// Connection URI.
    TransportUri,
    /// Wire protocol name.
    ProtocolName,
    /// Peer certificate verification toggle.
    TlsValidate,
    /// Trusted CA bundle.
    TlsCaPath,
    /// Buffering layer toggle.
    Buffered,
    /// Compression layer toggle.
    Compressed,
    /// Implicit per-request connection toggle.
    AlwaysConnect,
    /// Socket connect, read, and write timeout in milliseconds.
    SocketTimeoutMs,
    /// Log filter directive.
    LogFilter,
    /// Log output format.
    LogFormat,
}

/// Resolved configuration for one client instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(prefix = "TETHER")]
pub struct Config {
    /// Connection URI; required.
    pub transport_uri: Option<String>,
    /// Wire protocol name, validated when the client is built.
    #[ortho_config(default = default_protocol_name())]
    pub protocol_name: String,
    /// Verify the peer certificate for `tcps` and `unixs`.
    #[ortho_config(default = true)]
    pub tls_validate: bool,
    /// CA bundle used when `tls_validate` is set.
    pub tls_ca_path: Option<Utf8PathBuf>,
    /// Insert the buffering layer.
    #[ortho_config(default = false)]
    pub buffered: bool,
    /// Insert the zlib layer.
    #[ortho_config(default = false)]
    pub compressed: bool,
    /// Open and close the transport around every unit of work.
    #[ortho_config(default = true)]
    pub always_connect: bool,
    /// Socket timeout in milliseconds; unset or zero leaves the OS default.
    pub socket_timeout_ms: Option<u64>,
    /// Log filter directive.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport_uri: None,
            protocol_name: default_protocol_name(),
            tls_validate: true,
            tls_ca_path: None,
            buffered: false,
            compressed: false,
            always_connect: true,
            socket_timeout_ms: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Default configuration pointing at `uri`.
    #[must_use]
    pub fn for_transport(uri: impl Into<String>) -> Self {
        Self {
            transport_uri: Some(uri.into()),
            ..Self::default()
        }
    }

    /// Builds a configuration from a host framework's settings dictionary,
    /// layered over the defaults.
    ///
    /// Keys use the upper-case option names (`TRANSPORT_URI`,
    /// `PROTOCOL_NAME`, ...). Unrecognised keys are ignored so the host can
    /// pass its whole dictionary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidValue`] when a recognised key has
    /// a malformed value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::default().with_pairs(pairs)
    }

    /// Applies string pairs on top of this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidValue`] when a recognised key has
    /// a malformed value.
    pub fn with_pairs<I, K, V>(mut self, pairs: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in pairs {
            self.apply(key.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }

    /// Applies a single option. Returns `false` when the key is not recognised.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidValue`] when the value is malformed.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<bool, ConfigurationError> {
        let Ok(option) = ConfigKey::from_str(key) else {
            return Ok(false);
        };
        match option {
            ConfigKey::TransportUri => self.transport_uri = Some(value.to_owned()),
            ConfigKey::ProtocolName => value.clone_into(&mut self.protocol_name),
            ConfigKey::TlsValidate => self.tls_validate = parse_flag(option, value)?,
            ConfigKey::TlsCaPath => self.tls_ca_path = non_blank(value).map(Utf8PathBuf::from),
            ConfigKey::Buffered => self.buffered = parse_flag(option, value)?,
            ConfigKey::Compressed => self.compressed = parse_flag(option, value)?,
            ConfigKey::AlwaysConnect => self.always_connect = parse_flag(option, value)?,
            ConfigKey::SocketTimeoutMs => {
                self.socket_timeout_ms = non_blank(value)
                    .map(|millis| {
                        millis.parse::<u64>().map_err(|_| invalid(option, value, "milliseconds"))
                    })
                    .transpose()?;
            }
            ConfigKey::LogFilter => value.clone_into(&mut self.log_filter),
            ConfigKey::LogFormat => {
                self.log_format = LogFormat::from_str(value)
                    .map_err(|_| invalid(option, value, "one of json, compact"))?;
            }
        }
        Ok(true)
    }

    /// Parses the connection descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when `TRANSPORT_URI` is missing, empty,
    /// or malformed.
    pub fn descriptor(&self) -> Result<ConnectionDescriptor, ConfigurationError> {
        let uri = self
            .transport_uri
            .as_deref()
            .ok_or(ConfigurationError::MissingTransport)?;
        ConnectionDescriptor::parse(uri, self.tls_options())
    }

    /// TLS options for socket schemes.
    #[must_use]
    pub fn tls_options(&self) -> TlsOptions {
        TlsOptions {
            validate: self.tls_validate,
            ca_path: self.tls_ca_path.clone(),
        }
    }

    /// Resolves the configured protocol name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for unknown or unsupported names.
    pub fn protocol_kind(&self) -> Result<ProtocolKind, ConfigurationError> {
        ProtocolKind::resolve(&self.protocol_name)
    }

    /// Socket timeout, when configured.
    #[must_use]
    pub fn socket_timeout(&self) -> Option<Duration> {
        self.socket_timeout_ms
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
    }

    /// Log filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Logging settings for the telemetry initialiser.
    #[must_use]
    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            filter: self.log_filter.clone(),
            format: self.log_format,
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn parse_flag(key: ConfigKey, value: &str) -> Result<bool, ConfigurationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "a boolean")),
    }
}

fn invalid(key: ConfigKey, value: &str, expected: &'static str) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        key: key.to_string(),
        value: value.to_owned(),
        expected,
    }
}

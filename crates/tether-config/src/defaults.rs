use crate::logging::LogFormat;
use crate::protocol::ProtocolKind;

/// Port used by `tcp` and `tcps` URIs that omit one.
pub const DEFAULT_TCP_PORT: u16 = 9090;

/// Port used by `http` URIs that omit one.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Port used by `https` URIs that omit one.
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Protocol used when `PROTOCOL_NAME` is not configured.
pub const DEFAULT_PROTOCOL: ProtocolKind = ProtocolKind::Binary;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Owned protocol name used by serde defaults.
#[must_use]
pub fn default_protocol_name() -> String {
    DEFAULT_PROTOCOL.to_string()
}

//! Command-line interface definitions.

use std::ffi::OsString;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};

/// Output format for command results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned `key: value` lines.
    #[default]
    Human,
    /// A single JSON object.
    Json,
}

/// Inspects and exercises Thrift transport configuration.
#[derive(Parser, Debug)]
#[command(name = "tether", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Configuration file; overrides `TETHER_CONFIG_PATH`.
    #[arg(long, value_name = "PATH")]
    pub(crate) config_path: Option<Utf8PathBuf>,
    /// Connection URI, such as `tcp://localhost:9090`.
    #[arg(long, value_name = "URI")]
    pub(crate) transport_uri: Option<String>,
    /// Wire protocol name: BINARY, COMPACT, or JSON.
    #[arg(long, value_name = "NAME")]
    pub(crate) protocol_name: Option<String>,
    /// CA bundle used when validating peer certificates.
    #[arg(long, value_name = "PATH")]
    pub(crate) tls_ca_path: Option<Utf8PathBuf>,
    /// Insert the buffering layer.
    #[arg(long)]
    pub(crate) buffered: bool,
    /// Insert the zlib layer.
    #[arg(long)]
    pub(crate) compressed: bool,
    /// Socket timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    pub(crate) socket_timeout_ms: Option<u64>,
    /// Controls how results are rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Resolves the configuration and prints the transport it describes.
    Resolve,
    /// Opens the transport once and reports whether it connected.
    Probe,
}

impl Cli {
    /// Configuration flags rendered as the argument vector `ortho_config`
    /// parses. Flags that were not given are left out so lower layers apply.
    pub(crate) fn config_arguments(&self) -> Vec<OsString> {
        let mut arguments = vec![OsString::from("tether")];
        let mut push = |flag: &str, value: Option<String>| {
            arguments.push(OsString::from(flag));
            if let Some(value) = value {
                arguments.push(OsString::from(value));
            }
        };
        if let Some(path) = &self.config_path {
            push("--config-path", Some(path.to_string()));
        }
        if let Some(uri) = &self.transport_uri {
            push("--transport-uri", Some(uri.clone()));
        }
        if let Some(name) = &self.protocol_name {
            push("--protocol-name", Some(name.clone()));
        }
        if let Some(path) = &self.tls_ca_path {
            push("--tls-ca-path", Some(path.to_string()));
        }
        if self.buffered {
            push("--buffered", None);
        }
        if self.compressed {
            push("--compressed", None);
        }
        if let Some(millis) = self.socket_timeout_ms {
            push("--socket-timeout-ms", Some(millis.to_string()));
        }
        arguments
    }
}

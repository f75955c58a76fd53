//! Rendering of resolved client stacks.

use std::io::Write;

use serde::Serialize;

use tether::ThriftClient;
use tether_config::{ProtocolKind, Scheme};

use crate::cli::OutputFormat;
use crate::errors::AppError;

/// What a configuration resolved to.
#[derive(Debug, Serialize)]
pub(crate) struct Resolution {
    transport: String,
    scheme: Scheme,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    layers: String,
    protocol: ProtocolKind,
    always_connect: bool,
}

impl Resolution {
    pub(crate) fn new<C>(client: &ThriftClient<C>) -> Self {
        let descriptor = client.descriptor();
        Self {
            transport: descriptor.to_string(),
            scheme: descriptor.scheme(),
            host: descriptor.host().map(str::to_owned),
            port: descriptor.port(),
            path: descriptor.path().map(str::to_owned),
            layers: client.transport().layers().to_owned(),
            protocol: client.protocol_kind(),
            always_connect: client.policy().is_always(),
        }
    }

    pub(crate) fn write<W: Write>(
        &self,
        out: &mut W,
        format: OutputFormat,
        connected: bool,
    ) -> Result<(), AppError> {
        match format {
            OutputFormat::Json => {
                let mut value = serde_json::to_value(self)?;
                if let (true, Some(object)) = (connected, value.as_object_mut()) {
                    object.insert(String::from("connected"), serde_json::Value::Bool(true));
                }
                serde_json::to_writer(&mut *out, &value)?;
                writeln!(out)?;
            }
            OutputFormat::Human => {
                writeln!(out, "transport: {}", self.transport)?;
                writeln!(out, "scheme: {}", self.scheme)?;
                if let Some(host) = &self.host {
                    writeln!(out, "host: {host}")?;
                }
                if let Some(port) = self.port {
                    writeln!(out, "port: {port}")?;
                }
                if let Some(path) = &self.path {
                    writeln!(out, "path: {path}")?;
                }
                writeln!(out, "layers: {}", self.layers)?;
                writeln!(out, "protocol: {}", self.protocol)?;
                writeln!(out, "always_connect: {}", self.always_connect)?;
                if connected {
                    writeln!(out, "connected: true")?;
                }
            }
        }
        Ok(())
    }
}

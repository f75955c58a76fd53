//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use tether::{BuildError, ConnectionError, TelemetryError};

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("invalid configuration: {0}")]
    Build(#[from] BuildError),
    #[error("{error}: {cause}", error = .0, cause = .0.transport_error())]
    Connect(#[from] ConnectionError),
    #[error("failed to serialise result: {0}")]
    Serialise(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

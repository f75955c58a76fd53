//! Structured logging for processes that do not bring their own subscriber.
//!
//! An embedding host usually installs its own `tracing` subscriber before it
//! builds any client. [`initialise`] then leaves it in place and the
//! `tether::lifecycle` and `tether::transport` events flow into the host's
//! pipeline. Only a process with no subscriber (the `tether` binary, a bare
//! worker) gets the one configured by `LOG_FILTER` and `LOG_FORMAT`.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use tether_config::{LogFormat, LogSettings};

static SUBSCRIBER_OWNER: OnceCell<SubscriberOwner> = OnceCell::new();

/// Who installed the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberOwner {
    /// This crate installed it from the log settings.
    Tether,
    /// A subscriber was already present; the log settings were not applied.
    Host,
}

/// Handle returned once telemetry is settled for the process.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryHandle {
    owner: SubscriberOwner,
}

impl TelemetryHandle {
    /// Who owns the active subscriber.
    #[must_use]
    pub const fn owner(self) -> SubscriberOwner {
        self.owner
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
}

/// Settles the process-wide subscriber on first use.
///
/// The filter is validated on every call so a malformed `LOG_FILTER` fails
/// client construction even when the host owns logging.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the filter is malformed.
pub fn initialise(settings: &LogSettings) -> Result<TelemetryHandle, TelemetryError> {
    let filter = parse_filter(settings)?;
    let owner = *SUBSCRIBER_OWNER.get_or_init(|| install_subscriber(filter, settings.format));
    Ok(TelemetryHandle { owner })
}

fn parse_filter(settings: &LogSettings) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&settings.filter).map_err(|error| TelemetryError::Filter(error.to_string()))
}

fn install_subscriber(filter: EnvFilter, format: LogFormat) -> SubscriberOwner {
    if tracing::dispatcher::has_been_set() {
        return SubscriberOwner::Host;
    }

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    // Losing a race with a host that installs concurrently still leaves the
    // host in charge.
    match tracing::subscriber::set_global_default(subscriber) {
        Ok(()) => SubscriberOwner::Tether,
        Err(_) => SubscriberOwner::Host,
    }
}

//! Runtime for the `tether` command.
//!
//! `tether resolve` loads configuration through `ortho_config` (defaults,
//! file, `TETHER_` environment, then flags), builds the client stack without
//! connecting, and prints what it resolved to. `tether probe`
//! additionally opens the transport once, the way a request would.

mod cli;
mod errors;
mod output;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use tether::ThriftClient;
use tether_config::{ArgsConfigLoader, ConfigLoader};

pub use cli::OutputFormat;
use cli::{Cli, CliCommand};
use errors::AppError;
use output::Resolution;

/// Runs the CLI against the process environment.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = write!(stderr, "{}", AppError::CliUsage(error));
            return ExitCode::FAILURE;
        }
    };

    let loader = ArgsConfigLoader::new(cli.config_arguments());
    match execute(&cli, &loader, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W>(cli: &Cli, loader: &dyn ConfigLoader, stdout: &mut W) -> Result<(), AppError>
where
    W: Write,
{
    let config = loader.load().map_err(AppError::LoadConfiguration)?;
    tether::telemetry::initialise(&config.log_settings())?;

    let client = ThriftClient::new(|_, _| (), &config)?;
    let resolution = Resolution::new(&client);
    if cli.command == CliCommand::Probe {
        let scope = client.connect()?;
        drop(scope);
    }
    resolution.write(stdout, cli.output, cli.command == CliCommand::Probe)
}

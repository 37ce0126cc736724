//! Client for the local bridge daemon.
//!
//! [`IpcClient`] performs one request/response exchange per call over the
//! endpoint configured in [`bridge_config::Config`]. The `bridge` binary wraps
//! it in a small command-line tool:
//!
//! ```text
//! bridge --daemon-socket tcp://127.0.0.1:9781 call getServer '"srv-1"'
//! bridge methods
//! ```

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use bridge_config::Config;
use bridge_protocol::methods;
use clap::Parser;
use serde_json::Value;

mod cli;
mod client;
mod config;
mod errors;
mod transport;

use cli::{Cli, CliCommand};
pub use client::{DEFAULT_TIMEOUT, IpcClient};
use config::{ConfigLoader, OrthoConfigLoader, split_arguments};
pub(crate) use errors::AppError;
pub use errors::ClientError;

/// Runs the CLI with the given arguments and output streams.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

fn run_with_loader<I, W, E, L>(args: I, stdout: &mut W, stderr: &mut E, loader: &L) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_arguments(&args);

    let result = Cli::try_parse_from(&split.command_arguments)
        .map_err(AppError::CliUsage)
        .and_then(|cli| {
            let config = loader.load(&split.config_arguments)?;
            execute(cli.command, &config, stdout)
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            write!(stdout, "{error}").ok();
            ExitCode::SUCCESS
        }
        Err(error) => {
            writeln!(stderr, "{error}").ok();
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write>(command: CliCommand, config: &Config, stdout: &mut W) -> Result<(), AppError> {
    match command {
        CliCommand::Methods => methods::ALL
            .iter()
            .try_for_each(|name| writeln!(stdout, "{name}"))
            .map_err(AppError::WriteOutput),
        CliCommand::Call { method, params } => {
            let params = params
                .as_deref()
                .map(serde_json::from_str::<Value>)
                .transpose()
                .map_err(AppError::InvalidParams)?;
            let client = IpcClient::new(config.daemon_socket());
            let result = client.send(&method, params)?;
            let rendered = serde_json::to_string_pretty(&result).map_err(AppError::RenderResult)?;
            writeln!(stdout, "{rendered}").map_err(AppError::WriteOutput)
        }
    }
}

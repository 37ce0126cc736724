//! Command-line argument definitions for the bridge client.

use clap::{Parser, Subcommand};

/// Command-line client for the local bridge daemon.
#[derive(Parser, Debug)]
#[command(name = "bridge", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Invokes a daemon method and prints its JSON result.
    Call {
        /// Method name, for example `getServers`.
        #[arg(value_name = "METHOD")]
        method: String,
        /// Method arguments as a JSON document, for example `'"srv-1"'`.
        #[arg(value_name = "PARAMS")]
        params: Option<String>,
    },
    /// Lists the methods the daemon serves.
    Methods,
}

//! Shared configuration for the bridge daemon and its command-line client.
//!
//! Values are layered by `ortho_config`: built-in defaults, then a
//! `rmbridge.toml` file, then `RMBRIDGE_*` environment variables, then
//! command-line flags (`--daemon-socket`, `--log-filter`, `--log-format`).
//! The defaults layer always carries every field, so a load with no file,
//! no environment, and no flags still yields a complete configuration. The
//! accessors on [`Config`] apply the same defaults to hand-built values.

mod defaults;
mod logging;
mod socket;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT, default_log_filter, default_log_format,
    default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "RMBRIDGE")]
pub struct Config {
    /// Endpoint the daemon binds and clients connect to.
    #[serde(default)]
    #[ortho_config(default = default_socket_endpoint())]
    pub daemon_socket: Option<SocketEndpoint>,
    /// `tracing` filter expression, for example `info,bridged::dispatch=debug`.
    #[serde(default)]
    #[ortho_config(default = default_log_filter().to_owned())]
    pub log_filter: Option<String>,
    /// Rendering of log records.
    #[serde(default)]
    #[ortho_config(default = default_log_format())]
    pub log_format: Option<LogFormat>,
}

impl Config {
    /// Builds a configuration that only pins the endpoint.
    #[must_use]
    pub fn with_socket(endpoint: SocketEndpoint) -> Self {
        Self {
            daemon_socket: Some(endpoint),
            ..Self::default()
        }
    }

    /// Endpoint shared by the daemon and its clients.
    #[must_use]
    pub fn daemon_socket(&self) -> SocketEndpoint {
        self.daemon_socket
            .clone()
            .unwrap_or_else(default_socket_endpoint)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }
}

//! Error types for the bridge client and its command-line runtime.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use bridge_protocol::{DecodeError, EncodeError, FramingError};
use thiserror::Error;

/// Failure of a single client call.
///
/// Every variant rejects the call; nothing is retried.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint could not be reached.
    #[error("failed to connect to bridge at {endpoint}: {source}")]
    Connect {
        /// Endpoint the client tried to reach.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The call did not complete before its deadline.
    #[error("bridge at {endpoint} did not answer within {timeout:?}")]
    Timeout {
        /// Endpoint the call was sent to.
        endpoint: String,
        /// Budget the call was given.
        timeout: Duration,
    },
    /// The connection failed after it was established.
    #[error("connection to bridge at {endpoint} failed: {source}")]
    Transport {
        /// Endpoint the call was sent to.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The daemon's reply could not be understood.
    #[error("invalid response from bridge: {reason}")]
    Protocol {
        /// Description of what was wrong with the reply.
        reason: String,
    },
    /// The daemon answered with an error message.
    #[error("{message}")]
    Remote {
        /// Message supplied by the daemon.
        message: String,
    },
    /// The request could not be serialised.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl ClientError {
    pub(crate) fn connect(endpoint: impl ToString, source: io::Error) -> Self {
        Self::Connect {
            endpoint: endpoint.to_string(),
            source,
        }
    }

    pub(crate) fn timeout(endpoint: impl ToString, timeout: Duration) -> Self {
        Self::Timeout {
            endpoint: endpoint.to_string(),
            timeout,
        }
    }

    pub(crate) fn transport(endpoint: impl ToString, source: io::Error) -> Self {
        Self::Transport {
            endpoint: endpoint.to_string(),
            source,
        }
    }

    pub(crate) fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    /// Returns true when the call ran out of time.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<DecodeError> for ClientError {
    fn from(error: DecodeError) -> Self {
        Self::protocol(error.to_string())
    }
}

impl From<FramingError> for ClientError {
    fn from(error: FramingError) -> Self {
        Self::protocol(error.to_string())
    }
}

/// Failure of a command-line invocation.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("params must be a JSON document: {0}")]
    InvalidParams(serde_json::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to render result: {0}")]
    RenderResult(serde_json::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}

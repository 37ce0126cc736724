//! Error surface for running the daemon process.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrap failed before the endpoint was bound.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The listener could not be bound, started, or joined.
    #[error("socket listener failed: {0}")]
    Listener(#[from] ListenerError),
    /// Waiting for a termination signal failed.
    #[error("shutdown listener failed: {0}")]
    Shutdown(#[from] ShutdownError),
}

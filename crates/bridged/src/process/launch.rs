//! Launch sequencing for the daemon binary.

use std::sync::Arc;

use tracing::info;

use crate::backend::{Backend, InMemoryBackend};
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the daemon with the production collaborators.
///
/// Serves an [`InMemoryBackend`] until SIGTERM, SIGINT, SIGQUIT, or SIGHUP
/// arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] when any stage fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter),
        Arc::new(InMemoryBackend::new()),
        &SystemShutdownSignal,
    )
}

/// Runs the daemon with injected collaborators.
///
/// Bootstraps, binds and starts the listener, blocks on `shutdown`, then stops
/// the listener and waits for its accept thread.
///
/// # Errors
///
/// Returns [`LaunchError`] when any stage fails.
pub fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    backend: Arc<dyn Backend>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    info!(target: PROCESS_TARGET, "starting daemon runtime");
    let daemon = bootstrap_with(loader, reporter, backend)?;
    let handle = daemon.serve()?;
    let waited = shutdown.wait();
    daemon.shutdown(handle)?;
    waited?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}

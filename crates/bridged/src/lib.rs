//! Local bridge daemon.
//!
//! The daemon exposes application state to a UI process over a single local
//! endpoint, a Unix domain socket by default or a loopback TCP port where
//! Unix sockets are unavailable. Clients open one connection per call and
//! exchange line-delimited JSON envelopes defined in [`bridge_protocol`].
//!
//! The runtime is built from four layers:
//!
//! - [`transport`] binds the endpoint once and serves each accepted connection
//!   on its own thread until a cooperative stop is requested.
//! - [`dispatch`] reads request lines, routes them through a
//!   [`MethodRegistry`], and writes one response per request.
//! - [`backend`] holds the state the methods operate on, behind the
//!   [`Backend`] trait.
//! - [`bootstrap`](bootstrap_with) and [`run_daemon`] load configuration,
//!   install telemetry, and drive the process lifecycle.

pub mod backend;
mod bootstrap;
pub mod dispatch;
mod health;
mod process;
mod telemetry;
pub mod transport;

use std::sync::Arc;

use bridge_config::SocketEndpoint;

pub use backend::{Backend, BackendError, InMemoryBackend};
pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{DispatchConnectionHandler, DispatchError, MethodRegistry};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon, run_daemon_with,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{ListenerError, ListenerHandle, SocketListener};

/// Serves the standard method table for `backend` on `endpoint`.
///
/// No configuration is loaded and no telemetry is installed; this is the
/// embedding entry point for hosts and tests that manage those themselves.
///
/// # Errors
///
/// Returns [`ListenerError`] when the endpoint cannot be bound or the accept
/// thread cannot start.
pub fn serve(
    endpoint: &SocketEndpoint,
    backend: Arc<dyn Backend>,
) -> Result<(SocketEndpoint, ListenerHandle), ListenerError> {
    let listener = SocketListener::bind(endpoint)?;
    let bound = match (endpoint, listener.local_addr()) {
        (SocketEndpoint::Tcp { host, .. }, Some(addr)) => {
            SocketEndpoint::tcp(host.clone(), addr.port())
        }
        _ => endpoint.clone(),
    };
    let registry = Arc::new(MethodRegistry::standard(backend));
    let handle = listener.start(Arc::new(DispatchConnectionHandler::new(registry)))?;
    Ok((bound, handle))
}

#[cfg(test)]
mod tests;

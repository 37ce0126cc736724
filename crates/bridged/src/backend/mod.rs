//! Boundary between the dispatcher and the state it serves.
//!
//! The dispatcher owns no state; every method routes to one call on a
//! [`Backend`]. Implementations are shared across connection threads and must
//! synchronise internally.

use std::collections::BTreeMap;

use thiserror::Error;

mod interfaces;
mod memory;
mod types;

pub use self::memory::InMemoryBackend;
pub use self::types::{
    DashboardStats, DataSourceStatus, GeneralSettings, NetworkInterface, Outcome, ServerForm,
    ServerSummary, SessionSummary, ThemeSettings, UpdateServerParams,
};

/// Failure raised by a backend call.
///
/// Only the message crosses the wire, so the error carries nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    /// Creates an error with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Message shown to the caller.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result alias for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Network addresses grouped by interface name.
pub type InterfaceMap = BTreeMap<String, Vec<NetworkInterface>>;

/// Application state reachable over the bridge.
///
/// Lookups that take an identifier treat an empty one as "nothing selected"
/// and answer with a failed [`Outcome`], `None`, or `false` rather than an
/// error. `Err` is reserved for failures of the backend itself.
pub trait Backend: Send + Sync {
    /// All servers, in list order.
    fn servers(&self) -> BackendResult<Vec<ServerSummary>>;

    /// Distinct tag names.
    fn tags(&self) -> BackendResult<Vec<String>>;

    /// Editable fields of one server.
    fn server(&self, server_id: &str) -> BackendResult<Option<ServerForm>>;

    /// Adds a server to the local data source.
    fn add_server(&self, form: Option<ServerForm>) -> BackendResult<Outcome>;

    /// Replaces a server's editable fields.
    fn update_server(&self, params: Option<UpdateServerParams>) -> BackendResult<Outcome>;

    fn delete_server(&self, server_id: &str) -> BackendResult<Outcome>;

    /// Copies a server, suffixing its display name.
    fn duplicate_server(&self, server_id: &str) -> BackendResult<Outcome>;

    fn general_settings(&self) -> BackendResult<GeneralSettings>;

    fn update_general_settings(&self, settings: Option<GeneralSettings>)
    -> BackendResult<Outcome>;

    fn theme_settings(&self) -> BackendResult<ThemeSettings>;

    fn update_theme_settings(&self, settings: Option<ThemeSettings>) -> BackendResult<Outcome>;

    fn dashboard_stats(&self) -> BackendResult<DashboardStats>;

    /// Status of the local data source, or `None` when there is none.
    fn local_data_source_status(&self) -> BackendResult<Option<DataSourceStatus>>;

    /// Re-reads servers from the local data source.
    fn reload_servers(&self) -> BackendResult<Outcome>;

    fn active_sessions(&self) -> BackendResult<Vec<SessionSummary>>;

    fn close_session(&self, connection_id: &str) -> BackendResult<Outcome>;

    fn reconnect_session(&self, connection_id: &str) -> BackendResult<Outcome>;

    /// Opens a session to a server. Returns false when it does not exist.
    fn connect(&self, server_id: &str) -> BackendResult<bool>;

    /// Addresses of the host's network interfaces.
    fn network_interfaces(&self) -> BackendResult<InterfaceMap>;
}

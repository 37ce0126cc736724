//! Backend that keeps its state in process memory.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::interfaces::system_interfaces;
use super::{
    Backend, BackendError, BackendResult, DashboardStats, DataSourceStatus, GeneralSettings,
    InterfaceMap, Outcome, ServerForm, ServerSummary, SessionSummary, ThemeSettings,
    UpdateServerParams,
};

const DATA_SOURCE_NAME: &str = "Local";
const SUPPORTED_PROTOCOLS: [&str; 2] = ["RDP", "SSH"];
const RECENT_WINDOW: Duration = Duration::days(7);

#[derive(Debug, Clone)]
struct StoredServer {
    id: String,
    form: ServerForm,
    tags: Vec<String>,
    last_connect: Option<OffsetDateTime>,
}

impl StoredServer {
    fn sub_title(&self) -> String {
        let ServerForm {
            host,
            port,
            username,
            ..
        } = &self.form;
        let mut title = String::new();
        if !username.is_empty() {
            title.push_str(username);
            title.push('@');
        }
        title.push_str(host);
        if !port.is_empty() {
            title.push(':');
            title.push_str(port);
        }
        title
    }

    fn summary(&self) -> BackendResult<ServerSummary> {
        let last_connect_time = self
            .last_connect
            .map(|when| when.format(&Rfc3339))
            .transpose()
            .map_err(|error| BackendError::new(format!("failed to format timestamp: {error}")))?;
        Ok(ServerSummary {
            id: self.id.clone(),
            display_name: self.form.display_name.clone(),
            sub_title: self.sub_title(),
            protocol: self.form.protocol.clone(),
            tags: self.tags.clone(),
            last_connect_time,
            data_source_name: DATA_SOURCE_NAME.to_owned(),
        })
    }
}

#[derive(Debug, Clone)]
struct Session {
    server_id: String,
    status: &'static str,
}

#[derive(Debug, Default)]
struct State {
    servers: Vec<StoredServer>,
    sessions: BTreeMap<String, Session>,
    general: GeneralSettings,
    theme: ThemeSettings,
}

impl State {
    fn find(&self, server_id: &str) -> Option<&StoredServer> {
        self.servers.iter().find(|server| server.id == server_id)
    }

    fn find_mut(&mut self, server_id: &str) -> Option<&mut StoredServer> {
        self.servers.iter_mut().find(|server| server.id == server_id)
    }

    fn insert(&mut self, form: ServerForm, tags: Vec<String>) -> String {
        let id = Uuid::new_v4().to_string();
        self.servers.push(StoredServer {
            id: id.clone(),
            form,
            tags,
            last_connect: None,
        });
        id
    }
}

/// In-process [`Backend`] used by the daemon binary and the tests.
///
/// Servers added here live until the process exits. Connecting records the
/// time and opens a session marked `Connected`; no remote protocol is spoken.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
    interfaces: Option<InterfaceMap>,
}

impl InMemoryBackend {
    /// Creates an empty backend that reports the host's real interfaces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `interfaces` instead of enumerating the host.
    #[must_use]
    pub fn with_network_interfaces(mut self, interfaces: InterfaceMap) -> Self {
        self.interfaces = Some(interfaces);
        self
    }

    /// Adds a server directly, bypassing protocol validation.
    ///
    /// Returns the new server's identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the state lock is poisoned.
    pub fn seed(
        &self,
        form: ServerForm,
        tags: Vec<String>,
        last_connect: Option<OffsetDateTime>,
    ) -> BackendResult<String> {
        let mut state = self.write()?;
        let id = state.insert(form, tags);
        if let Some(server) = state.find_mut(&id) {
            server.last_connect = last_connect;
        }
        Ok(id)
    }

    fn read(&self) -> BackendResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| BackendError::new("backend state lock poisoned"))
    }

    fn write(&self) -> BackendResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| BackendError::new("backend state lock poisoned"))
    }
}

impl Backend for InMemoryBackend {
    fn servers(&self) -> BackendResult<Vec<ServerSummary>> {
        self.read()?
            .servers
            .iter()
            .map(StoredServer::summary)
            .collect()
    }

    fn tags(&self) -> BackendResult<Vec<String>> {
        let state = self.read()?;
        let tags: BTreeSet<&String> = state
            .servers
            .iter()
            .flat_map(|server| server.tags.iter())
            .collect();
        Ok(tags.into_iter().cloned().collect())
    }

    fn server(&self, server_id: &str) -> BackendResult<Option<ServerForm>> {
        if server_id.is_empty() {
            return Ok(None);
        }
        Ok(self
            .read()?
            .find(server_id)
            .map(|server| server.form.clone()))
    }

    fn add_server(&self, form: Option<ServerForm>) -> BackendResult<Outcome> {
        let Some(mut form) = form else {
            return Ok(Outcome::fail("Request body is empty"));
        };
        let Some(protocol) = SUPPORTED_PROTOCOLS
            .iter()
            .find(|known| known.eq_ignore_ascii_case(&form.protocol))
        else {
            return Ok(Outcome::fail("Invalid protocol or protocol creation failed"));
        };
        (*protocol).clone_into(&mut form.protocol);
        self.write()?.insert(form, Vec::new());
        Ok(Outcome::ok())
    }

    fn update_server(&self, params: Option<UpdateServerParams>) -> BackendResult<Outcome> {
        let Some(UpdateServerParams { server_id, server }) = params else {
            return Ok(Outcome::fail("Request body is empty"));
        };
        if server_id.is_empty() {
            return Ok(Outcome::fail("Invalid parameters"));
        }
        let mut state = self.write()?;
        let Some(stored) = state.find_mut(&server_id) else {
            return Ok(Outcome::fail("Server not found"));
        };
        let form = &mut stored.form;
        form.display_name = server.display_name;
        form.host = server.host;
        form.port = server.port;
        form.username = server.username;
        if !server.password.is_empty() {
            form.password = server.password;
        }
        Ok(Outcome::ok())
    }

    fn delete_server(&self, server_id: &str) -> BackendResult<Outcome> {
        if server_id.is_empty() {
            return Ok(Outcome::fail("Server ID is empty"));
        }
        let mut state = self.write()?;
        let before = state.servers.len();
        state.servers.retain(|server| server.id != server_id);
        if state.servers.len() == before {
            return Ok(Outcome::fail("Server not found"));
        }
        Ok(Outcome::ok())
    }

    fn duplicate_server(&self, server_id: &str) -> BackendResult<Outcome> {
        if server_id.is_empty() {
            return Ok(Outcome::fail("Server ID is empty"));
        }
        let mut state = self.write()?;
        let Some(original) = state.find(server_id).cloned() else {
            return Ok(Outcome::fail("Server not found"));
        };
        let mut form = original.form;
        form.display_name.push_str(" (Copy)");
        state.insert(form, original.tags);
        Ok(Outcome::ok())
    }

    fn general_settings(&self) -> BackendResult<GeneralSettings> {
        Ok(self.read()?.general.clone())
    }

    fn update_general_settings(
        &self,
        settings: Option<GeneralSettings>,
    ) -> BackendResult<Outcome> {
        let Some(settings) = settings else {
            return Ok(Outcome::fail("Empty settings"));
        };
        self.write()?.general = settings;
        Ok(Outcome::ok())
    }

    fn theme_settings(&self) -> BackendResult<ThemeSettings> {
        Ok(self.read()?.theme.clone())
    }

    fn update_theme_settings(&self, settings: Option<ThemeSettings>) -> BackendResult<Outcome> {
        let Some(settings) = settings else {
            return Ok(Outcome::fail("Empty settings"));
        };
        let mut state = self.write()?;
        state.theme.theme_name = settings.theme_name;
        if !settings.accent_mid_color.is_empty() {
            state.theme.accent_mid_color = settings.accent_mid_color;
        }
        Ok(Outcome::ok())
    }

    fn dashboard_stats(&self) -> BackendResult<DashboardStats> {
        let state = self.read()?;
        let cutoff = OffsetDateTime::now_utc() - RECENT_WINDOW;
        let recent = state
            .servers
            .iter()
            .filter(|server| server.last_connect.is_some_and(|when| when > cutoff))
            .count();
        Ok(DashboardStats {
            active_sessions: state.sessions.len(),
            total_servers: state.servers.len(),
            favorites: 0,
            recent,
        })
    }

    fn local_data_source_status(&self) -> BackendResult<Option<DataSourceStatus>> {
        Ok(Some(DataSourceStatus {
            data_source_name: DATA_SOURCE_NAME.to_owned(),
            database_type: "Memory".to_owned(),
            status: "OK".to_owned(),
            status_info: String::new(),
            path: String::new(),
            is_writable: true,
        }))
    }

    fn reload_servers(&self) -> BackendResult<Outcome> {
        // Memory is the source of truth, so there is nothing to re-read.
        drop(self.read()?);
        Ok(Outcome::ok())
    }

    fn active_sessions(&self) -> BackendResult<Vec<SessionSummary>> {
        let state = self.read()?;
        Ok(state
            .sessions
            .iter()
            .map(|(connection_id, session)| {
                let server = state.find(&session.server_id);
                SessionSummary {
                    connection_id: connection_id.clone(),
                    server_id: session.server_id.clone(),
                    display_name: server
                        .map(|found| found.form.display_name.clone())
                        .unwrap_or_default(),
                    sub_title: server.map(StoredServer::sub_title).unwrap_or_default(),
                    protocol: server
                        .map(|found| found.form.protocol.clone())
                        .unwrap_or_default(),
                    status: session.status.to_owned(),
                }
            })
            .collect())
    }

    fn close_session(&self, connection_id: &str) -> BackendResult<Outcome> {
        if connection_id.is_empty() {
            return Ok(Outcome::fail("Connection ID is empty"));
        }
        // Closing an unknown session succeeds; the close is fire-and-forget.
        self.write()?.sessions.remove(connection_id);
        Ok(Outcome::ok())
    }

    fn reconnect_session(&self, connection_id: &str) -> BackendResult<Outcome> {
        if connection_id.is_empty() {
            return Ok(Outcome::fail("Connection ID is empty"));
        }
        let mut state = self.write()?;
        let Some(server_id) = state
            .sessions
            .get(connection_id)
            .map(|session| session.server_id.clone())
        else {
            return Ok(Outcome::fail("Session not found"));
        };
        if let Some(server) = state.find_mut(&server_id) {
            server.last_connect = Some(OffsetDateTime::now_utc());
        }
        Ok(Outcome::ok())
    }

    fn connect(&self, server_id: &str) -> BackendResult<bool> {
        if server_id.is_empty() {
            return Ok(false);
        }
        let mut state = self.write()?;
        let Some(server) = state.find_mut(server_id) else {
            return Ok(false);
        };
        server.last_connect = Some(OffsetDateTime::now_utc());
        state.sessions.insert(
            Uuid::new_v4().to_string(),
            Session {
                server_id: server_id.to_owned(),
                status: "Connected",
            },
        );
        Ok(true)
    }

    fn network_interfaces(&self) -> BackendResult<InterfaceMap> {
        match &self.interfaces {
            Some(fixed) => Ok(fixed.clone()),
            None => system_interfaces(),
        }
    }
}

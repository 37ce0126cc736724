//! Method names understood by the daemon.
//!
//! Names are matched exactly and case-sensitively.

/// Lists every configured server.
pub const GET_SERVERS: &str = "getServers";
/// Lists every tag name in use.
pub const GET_TAGS: &str = "getTags";
/// Loads the editable form of one server by id.
pub const GET_SERVER: &str = "getServer";
/// Creates a server from a form.
pub const ADD_SERVER: &str = "addServer";
/// Replaces the form of an existing server.
pub const UPDATE_SERVER: &str = "updateServer";
/// Deletes a server by id.
pub const DELETE_SERVER: &str = "deleteServer";
/// Copies a server by id.
pub const DUPLICATE_SERVER: &str = "duplicateServer";
/// Reads the general settings.
pub const GET_GENERAL_SETTINGS: &str = "getGeneralSettings";
/// Replaces the general settings.
pub const UPDATE_GENERAL_SETTINGS: &str = "updateGeneralSettings";
/// Reads the theme settings.
pub const GET_THEME_SETTINGS: &str = "getThemeSettings";
/// Replaces the theme settings.
pub const UPDATE_THEME_SETTINGS: &str = "updateThemeSettings";
/// Summarises servers and sessions for the dashboard.
pub const GET_DASHBOARD_STATS: &str = "getDashboardStats";
/// Reports the state of the local data source.
pub const GET_LOCAL_DATA_SOURCE_STATUS: &str = "getLocalDataSourceStatus";
/// Reloads servers from the data source.
pub const RELOAD_SERVERS: &str = "reloadServers";
/// Lists open sessions.
pub const GET_ACTIVE_SESSIONS: &str = "getActiveSessions";
/// Closes a session by connection id.
pub const CLOSE_SESSION: &str = "closeSession";
/// Reconnects a session by connection id.
pub const RECONNECT_SESSION: &str = "reconnectSession";
/// Opens a session to a server by id.
pub const CONNECT: &str = "connect";
/// Lists the host's network interfaces.
pub const GET_NETWORK_INTERFACES: &str = "getNetworkInterfaces";

/// Every method name, in registration order.
pub const ALL: &[&str] = &[
    GET_SERVERS,
    GET_TAGS,
    GET_SERVER,
    ADD_SERVER,
    UPDATE_SERVER,
    DELETE_SERVER,
    DUPLICATE_SERVER,
    GET_GENERAL_SETTINGS,
    UPDATE_GENERAL_SETTINGS,
    GET_THEME_SETTINGS,
    UPDATE_THEME_SETTINGS,
    GET_DASHBOARD_STATS,
    GET_LOCAL_DATA_SOURCE_STATUS,
    RELOAD_SERVERS,
    GET_ACTIVE_SESSIONS,
    CLOSE_SESSION,
    RECONNECT_SESSION,
    CONNECT,
    GET_NETWORK_INTERFACES,
];

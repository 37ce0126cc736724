//! Payloads exchanged with the backend collaborator.
//!
//! Every type serialises with `camelCase` member names. Missing members fall
//! back to their defaults when decoded, so partially filled forms from the UI
//! are accepted.

use serde::{Deserialize, Serialize};

/// Row shown in the server list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSummary {
    /// Stable server identifier.
    pub id: String,
    /// Name shown in the list.
    pub display_name: String,
    /// Secondary line, usually `user@host:port`.
    pub sub_title: String,
    /// Short protocol name such as `RDP` or `SSH`.
    pub protocol: String,
    /// Tags attached to the server.
    pub tags: Vec<String>,
    /// RFC 3339 timestamp of the last connection, if any.
    pub last_connect_time: Option<String>,
    /// Name of the data source that owns the server.
    pub data_source_name: String,
}

/// Editable server fields used by `getServer` and `addServer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerForm {
    /// Protocol name, matched case-insensitively.
    pub protocol: String,
    /// Name shown in the list.
    pub display_name: String,
    /// Remote host name or address.
    pub host: String,
    /// Remote port kept as text, as entered.
    pub port: String,
    /// Login name.
    pub username: String,
    /// Login secret; an empty value leaves a stored password unchanged on update.
    pub password: String,
}

/// Parameters of `updateServer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateServerParams {
    /// Server to update.
    pub server_id: String,
    /// Replacement fields.
    pub server: ServerForm,
}

/// Application-wide preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralSettings {
    /// UI language code.
    pub language: String,
    pub do_not_check_new_version: bool,
    pub app_start_automatically: bool,
    /// What the window close button does.
    pub close_button_behavior: i32,
    pub confirm_before_closing_session: bool,
    pub show_session_icon_in_session_window: bool,
    pub log_level: i32,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            language: "en-us".to_owned(),
            do_not_check_new_version: false,
            app_start_automatically: false,
            close_button_behavior: 0,
            confirm_before_closing_session: false,
            show_session_icon_in_session_window: false,
            log_level: 0,
        }
    }
}

/// Theme preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeSettings {
    pub theme_name: String,
    /// Accent colour; an empty value leaves the stored colour unchanged on update.
    pub accent_mid_color: String,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            theme_name: "Dark".to_owned(),
            accent_mid_color: String::new(),
        }
    }
}

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub active_sessions: usize,
    pub total_servers: usize,
    pub favorites: usize,
    /// Servers connected to within the last seven days.
    pub recent: usize,
}

/// Health of the local data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataSourceStatus {
    pub data_source_name: String,
    pub database_type: String,
    pub status: String,
    pub status_info: String,
    pub path: String,
    pub is_writable: bool,
}

/// An open remote session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSummary {
    pub connection_id: String,
    pub server_id: String,
    pub display_name: String,
    pub sub_title: String,
    pub protocol: String,
    pub status: String,
}

/// One address bound to a host network interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkInterface {
    pub address: String,
    pub netmask: String,
    /// `IPv4` or `IPv6`.
    pub family: String,
    /// Colon-separated hardware address.
    pub mac: String,
    /// True for loopback interfaces.
    pub internal: bool,
    /// `address/prefix`, present for IPv4 addresses only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
}

/// Result of a mutation.
///
/// A failed outcome is still a successful call: the request was understood
/// and answered, the business operation just did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    /// Successful outcome without a message.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Failed outcome carrying `message`.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

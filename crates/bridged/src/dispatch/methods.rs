//! Standard method table backed by a [`Backend`].

use std::sync::Arc;

use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};

use bridge_protocol::methods;

use super::registry::MethodRegistry;
use crate::backend::{
    Backend, BackendResult, GeneralSettings, ServerForm, ThemeSettings, UpdateServerParams,
};

impl MethodRegistry {
    /// Builds a registry exposing every bridge method against `backend`.
    ///
    /// Methods that take no arguments ignore any `params` they are sent.
    /// Methods that take an identifier expect a JSON string; a missing one is
    /// treated as empty.
    #[must_use]
    pub fn standard(backend: Arc<dyn Backend>) -> Self {
        let mut registry = Self::new();
        BackendRoutes {
            registry: &mut registry,
            backend,
        }
        .route(methods::GET_SERVERS, |backend, _: IgnoredAny| backend.servers())
        .route(methods::GET_TAGS, |backend, _: IgnoredAny| backend.tags())
        .route(methods::GET_SERVER, |backend, id: Option<String>| {
            backend.server(&id.unwrap_or_default())
        })
        .route(methods::ADD_SERVER, |backend, form: Option<ServerForm>| {
            backend.add_server(form)
        })
        .route(
            methods::UPDATE_SERVER,
            |backend, params: Option<UpdateServerParams>| backend.update_server(params),
        )
        .route(methods::DELETE_SERVER, |backend, id: Option<String>| {
            backend.delete_server(&id.unwrap_or_default())
        })
        .route(methods::DUPLICATE_SERVER, |backend, id: Option<String>| {
            backend.duplicate_server(&id.unwrap_or_default())
        })
        .route(methods::GET_GENERAL_SETTINGS, |backend, _: IgnoredAny| {
            backend.general_settings()
        })
        .route(
            methods::UPDATE_GENERAL_SETTINGS,
            |backend, settings: Option<GeneralSettings>| backend.update_general_settings(settings),
        )
        .route(methods::GET_THEME_SETTINGS, |backend, _: IgnoredAny| {
            backend.theme_settings()
        })
        .route(
            methods::UPDATE_THEME_SETTINGS,
            |backend, settings: Option<ThemeSettings>| backend.update_theme_settings(settings),
        )
        .route(methods::GET_DASHBOARD_STATS, |backend, _: IgnoredAny| {
            backend.dashboard_stats()
        })
        .route(methods::GET_LOCAL_DATA_SOURCE_STATUS, |backend, _: IgnoredAny| {
            backend.local_data_source_status()
        })
        .route(methods::RELOAD_SERVERS, |backend, _: IgnoredAny| {
            backend.reload_servers()
        })
        .route(methods::GET_ACTIVE_SESSIONS, |backend, _: IgnoredAny| {
            backend.active_sessions()
        })
        .route(methods::CLOSE_SESSION, |backend, id: Option<String>| {
            backend.close_session(&id.unwrap_or_default())
        })
        .route(methods::RECONNECT_SESSION, |backend, id: Option<String>| {
            backend.reconnect_session(&id.unwrap_or_default())
        })
        .route(methods::CONNECT, |backend, id: Option<String>| {
            backend.connect(&id.unwrap_or_default())
        })
        .route(methods::GET_NETWORK_INTERFACES, |backend, _: IgnoredAny| {
            backend.network_interfaces()
        });
        registry
    }
}

/// Registers handlers that share one backend.
struct BackendRoutes<'a> {
    registry: &'a mut MethodRegistry,
    backend: Arc<dyn Backend>,
}

impl BackendRoutes<'_> {
    fn route<P, R, F>(&mut self, name: &str, call: F) -> &mut Self
    where
        P: DeserializeOwned + 'static,
        R: Serialize + 'static,
        F: Fn(&dyn Backend, P) -> BackendResult<R> + Send + Sync + 'static,
    {
        let backend = Arc::clone(&self.backend);
        self.registry
            .register_typed(name, move |params: P| call(backend.as_ref(), params));
        self
    }
}

//! Name-to-handler table used by the connection handler.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::DISPATCH_TARGET;
use super::errors::DispatchError;

/// A single callable method.
///
/// Handlers receive the raw `params` member and decode it themselves.
pub trait MethodHandler: Send + Sync {
    /// Runs the method.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the parameters are unusable or the
    /// method fails.
    fn call(&self, params: Option<Value>) -> Result<Value, DispatchError>;
}

impl<F> MethodHandler for F
where
    F: Fn(Option<Value>) -> Result<Value, DispatchError> + Send + Sync,
{
    fn call(&self, params: Option<Value>) -> Result<Value, DispatchError> {
        self(params)
    }
}

/// Routes method names to handlers.
///
/// Names match exactly and case-sensitively. The registry holds no state of
/// its own beyond the table, so one instance is shared by every connection.
#[derive(Default)]
pub struct MethodRegistry {
    handlers: HashMap<String, Box<dyn MethodHandler>>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any earlier handler.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl MethodHandler + 'static,
    ) -> &mut Self {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    /// Registers a handler working on typed parameters and results.
    ///
    /// Absent parameters decode from JSON `null`, so `Option<T>` and
    /// [`serde::de::IgnoredAny`] accept calls without `params`.
    pub fn register_typed<P, R, E, F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        P: DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: Into<DispatchError> + 'static,
        F: Fn(P) -> Result<R, E> + Send + Sync + 'static,
    {
        let method: String = name.into();
        let label = method.clone();
        self.register(
            method,
            move |params: Option<Value>| -> Result<Value, DispatchError> {
                let decoded: P = serde_json::from_value(params.unwrap_or(Value::Null))
                    .map_err(|source| DispatchError::invalid_params(label.as_str(), source))?;
                let result = handler(decoded).map_err(Into::<DispatchError>::into)?;
                serde_json::to_value(result).map_err(|source| DispatchError::SerializeResult {
                    method: label.clone(),
                    source,
                })
            },
        )
    }

    /// Returns true when `name` has a handler.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Runs the handler registered under `method`.
    ///
    /// A panicking handler is contained and reported as
    /// [`DispatchError::Panicked`].
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MethodNotFound`] for unknown names, otherwise
    /// whatever the handler reports.
    pub fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, DispatchError> {
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| DispatchError::method_not_found(method))?;
        panic::catch_unwind(AssertUnwindSafe(|| handler.call(params))).unwrap_or_else(|_| {
            warn!(target: DISPATCH_TARGET, method, "method handler panicked");
            Err(DispatchError::panicked(method))
        })
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.names())
            .finish()
    }
}

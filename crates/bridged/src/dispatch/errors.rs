//! Error types for method dispatch.
//!
//! Every variant ends up as the `error` member of a response envelope, so
//! the display text is what the client sees.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors surfaced while routing a request to its handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered under the requested name.
    #[error("Method '{method}' not found")]
    MethodNotFound {
        /// Name the client asked for.
        method: String,
    },

    /// The request parameters do not match the handler's expected shape.
    #[error("invalid params for '{method}': {source}")]
    InvalidParams {
        /// Method whose parameters failed to decode.
        method: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// The handler ran and reported a failure.
    #[error("{message}")]
    Handler {
        /// Message produced by the handler.
        message: String,
    },

    /// The handler's result could not be converted to JSON.
    #[error("failed to serialize result of '{method}': {source}")]
    SerializeResult {
        /// Method that produced the result.
        method: String,
        /// Encoder error.
        #[source]
        source: serde_json::Error,
    },

    /// The handler panicked.
    #[error("internal error while handling '{method}'")]
    Panicked {
        /// Method whose handler panicked.
        method: String,
    },
}

impl DispatchError {
    /// Creates a method-not-found error.
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Creates an invalid-params error.
    pub fn invalid_params(method: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidParams {
            method: method.into(),
            source,
        }
    }

    /// Creates a handler error carrying `message`.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// Creates a panicked-handler error.
    pub fn panicked(method: impl Into<String>) -> Self {
        Self::Panicked {
            method: method.into(),
        }
    }
}

impl From<BackendError> for DispatchError {
    fn from(error: BackendError) -> Self {
        Self::handler(error.message())
    }
}

//! Request and response envelopes.

use serde::Serialize;
use serde_json::Value;

use crate::errors::{DecodeError, EncodeError};
use crate::fields::{json_kind, lookup, optional_string, parse_object, strip_bom};

/// One call from a client.
///
/// `id` is an opaque correlation token chosen by the client. The daemon copies
/// it into the matching [`Response`] and attaches no other meaning to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// Name of the method to invoke.
    pub method: String,
    /// Method arguments; `None` when the method takes none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Client correlation token.
    pub id: String,
}

impl Request {
    /// Builds a request envelope.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>, id: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params,
            id: id.into(),
        }
    }

    /// Decodes a request from one line, with or without its terminator.
    ///
    /// A missing `id` decodes as the empty string and a `null` `params` as no
    /// arguments.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the line is not a JSON object or lacks a
    /// string `method`.
    pub fn decode(line: &[u8]) -> Result<Self, DecodeError> {
        let object = parse_object(line)?;
        let method = match lookup(&object, "method") {
            Some(Value::String(method)) => method.clone(),
            None | Some(Value::Null) => return Err(DecodeError::MissingField { field: "method" }),
            Some(other) => {
                return Err(DecodeError::InvalidField {
                    field: "method",
                    expected: "string",
                    found: json_kind(other),
                });
            }
        };
        let id = optional_string(&object, "id")?.unwrap_or_default();
        let params = lookup(&object, "params")
            .filter(|value| !value.is_null())
            .cloned();
        Ok(Self { method, params, id })
    }

    /// Encodes the request as a single `\n`-terminated line.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if serialisation fails.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        encode_line(self)
    }
}

/// The daemon's answer to one [`Request`].
///
/// A non-empty `error` marks failure and takes precedence over any `result`
/// that may also be present. Otherwise the call succeeded; a missing or `null`
/// `result` is a void success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Correlation token copied from the request (empty when the request could
    /// not be decoded).
    pub id: String,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Builds a successful response.
    #[must_use]
    pub fn success(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    /// Builds a failed response carrying `message`.
    #[must_use]
    pub fn failure(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: None,
            error: Some(message.into()),
        }
    }

    /// Returns the failure message when the response marks an error.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|message| !message.is_empty())
    }

    /// Converts the response into the call outcome.
    ///
    /// # Errors
    ///
    /// Returns the remote message when [`Response::error_message`] is set.
    pub fn into_result(self) -> Result<Value, String> {
        match self.error {
            Some(message) if !message.is_empty() => Err(message),
            _ => Ok(self.result.unwrap_or(Value::Null)),
        }
    }

    /// Decodes a response from one line, with or without its terminator.
    ///
    /// Non-string `error` values are kept in their JSON text form so that a
    /// failure is never mistaken for success.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the line is not a JSON object or `id` is
    /// not a string.
    pub fn decode(line: &[u8]) -> Result<Self, DecodeError> {
        let object = parse_object(line)?;
        let id = optional_string(&object, "id")?.unwrap_or_default();
        let error = match lookup(&object, "error") {
            None | Some(Value::Null) => None,
            Some(Value::String(message)) => Some(message.clone()),
            Some(other) => Some(other.to_string()),
        };
        let result = lookup(&object, "result").cloned();
        Ok(Self { id, result, error })
    }

    /// Encodes the response as a single `\n`-terminated line.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if serialisation fails.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        encode_line(self)
    }
}

/// Returns true for a line that carries no envelope at all.
///
/// A byte-order mark and a trailing carriage return are ignored. Peers send an
/// empty line to end a conversation.
#[must_use]
pub fn is_blank_line(line: &[u8]) -> bool {
    let unmarked = strip_bom(line);
    let content = unmarked.strip_suffix(b"\n").unwrap_or(unmarked);
    content.strip_suffix(b"\r").unwrap_or(content).is_empty()
}

fn encode_line<T: Serialize>(envelope: &T) -> Result<Vec<u8>, EncodeError> {
    let mut line = serde_json::to_vec(envelope)?;
    line.push(b'\n');
    Ok(line)
}

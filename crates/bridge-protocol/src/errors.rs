//! Error types for framing, decoding, and encoding envelopes.

use std::io;

use thiserror::Error;

/// Errors raised while splitting a byte stream into lines.
#[derive(Debug, Error)]
pub enum FramingError {
    /// The peer closed the stream part-way through a line.
    #[error("stream closed after {buffered} bytes without a line terminator")]
    Unterminated {
        /// Number of bytes received since the last terminator.
        buffered: usize,
    },
    /// A single line grew past the configured limit.
    #[error("line of {size} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Bytes buffered when the limit was crossed.
        size: usize,
        /// Configured limit.
        max: usize,
    },
    /// The underlying stream failed.
    #[error("failed to read line: {0}")]
    Io(#[from] io::Error),
}

impl FramingError {
    /// Returns true when the read gave up because the stream's read timeout
    /// elapsed rather than because the stream failed.
    ///
    /// Partially received bytes are kept by the [`LineReader`](crate::LineReader)
    /// so the caller may retry the read.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(error)
                if matches!(error.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        )
    }
}

/// Errors raised while decoding a line into an envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The line was not UTF-8 text.
    #[error("line is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// The line contained nothing but whitespace.
    #[error("empty envelope")]
    Empty,
    /// The line was not a JSON document.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON document was valid but not an object.
    #[error("envelope must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },
    /// A required member was absent.
    #[error("envelope is missing the '{field}' field")]
    MissingField {
        /// Canonical name of the member.
        field: &'static str,
    },
    /// A member carried a value of the wrong JSON type.
    #[error("envelope field '{field}' must be a {expected}, found {found}")]
    InvalidField {
        /// Canonical name of the member.
        field: &'static str,
        /// Expected JSON type.
        expected: &'static str,
        /// JSON type that was found instead.
        found: &'static str,
    },
}

/// Error raised when an envelope cannot be serialised.
#[derive(Debug, Error)]
#[error("failed to encode envelope: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

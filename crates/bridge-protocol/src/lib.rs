//! Wire types shared by the bridge daemon and its clients.
//!
//! The protocol is line-delimited JSON over a local byte stream. A client
//! writes one request envelope per line:
//!
//! ```json
//! {"method":"getServer","params":"srv-1","id":"3f9a0c1e"}
//! ```
//!
//! and the daemon answers each line with exactly one response envelope, in
//! order:
//!
//! ```json
//! {"id":"3f9a0c1e","result":{"displayName":"build box"}}
//! {"id":"3f9a0c1e","error":"Method 'bogus' not found"}
//! ```
//!
//! Decoding is lenient about the peer's encoder: a leading byte-order mark is
//! skipped and field names are matched case-insensitively, so envelopes
//! produced with `PascalCase` members (`Result`, `Error`) decode the same as
//! the canonical lower-case form. Lines are bounded by [`MAX_LINE_BYTES`].

mod envelope;
mod errors;
mod fields;
mod framing;
pub mod methods;

pub use envelope::{Request, Response, is_blank_line};
pub use errors::{DecodeError, EncodeError, FramingError};
pub use framing::{LineReader, MAX_LINE_BYTES};

//! Request dispatch for bridge connections.
//!
//! Each connection carries a sequence of request lines. The
//! [`DispatchConnectionHandler`] decodes every line into a request envelope,
//! routes it through a [`MethodRegistry`], and writes exactly one response
//! line back before reading the next request:
//!
//! ```json
//! {"method":"connect","params":"srv-1","id":"a1"}
//! {"id":"a1","result":false}
//! ```
//!
//! Failures at any stage become the `error` member of the response; they
//! never end the connection on their own.

mod errors;
mod handler;
mod methods;
mod registry;

pub use self::errors::DispatchError;
pub use self::handler::DispatchConnectionHandler;
pub use self::registry::{MethodHandler, MethodRegistry};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

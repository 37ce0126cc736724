//! Socket listener for the daemon endpoint.
//!
//! The listener binds the configured endpoint once, accepts connections on a
//! background thread, and hands each one to a [`ConnectionHandler`] running on
//! its own thread. Stopping the listener is cooperative: the accept loop and
//! every idle connection poll a shared [`ShutdownToken`].

mod errors;
mod listener;
mod shutdown;
mod stream;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub use self::listener::{ListenerHandle, SocketListener};
pub use self::shutdown::ShutdownToken;
pub use self::stream::{ConnectionHandler, ConnectionStream};
#[cfg(test)]
pub(crate) use self::test_utils::{CapturedLogs, CountingHandler, wait_for};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

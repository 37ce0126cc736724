//! One-shot request/response calls against the bridge daemon.
//!
//! Each call opens a fresh connection, writes a single request line, reads a
//! single response line, and closes the connection. The whole exchange,
//! connect included, shares one deadline.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use bridge_config::SocketEndpoint;
use bridge_protocol::{FramingError, LineReader, Request, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ClientError;
use crate::transport::{Connection, connect};

const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client");

/// Budget for one call when none is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Length of the correlation token attached to each request.
const ID_LENGTH: usize = 8;

/// Client for the bridge daemon.
///
/// The client holds no connection between calls, so it is cheap to clone and
/// safe to share across threads.
#[derive(Debug, Clone)]
pub struct IpcClient {
    endpoint: SocketEndpoint,
    timeout: Duration,
}

impl IpcClient {
    /// Creates a client for `endpoint` with the [`DEFAULT_TIMEOUT`].
    #[must_use]
    pub fn new(endpoint: SocketEndpoint) -> Self {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Creates a client whose calls give up after `timeout`.
    #[must_use]
    pub fn with_timeout(endpoint: SocketEndpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    /// Endpoint calls are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Budget for each call.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invokes `method` and returns its result, which may be `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connect`] when the daemon cannot be reached,
    /// [`ClientError::Timeout`] when the deadline passes first,
    /// [`ClientError::Protocol`] when the reply cannot be decoded, and
    /// [`ClientError::Remote`] when the daemon reports an error.
    pub fn send(&self, method: &str, params: Option<Value>) -> Result<Value, ClientError> {
        let request = Request::new(method, params, request_id());
        let payload = request.encode()?;
        let deadline = Deadline::start(self.timeout);
        let started = Instant::now();

        let outcome = self.exchange(&payload, &deadline).and_then(|response| {
            if response.id != request.id {
                debug!(
                    target: CLIENT_TARGET,
                    sent = %request.id,
                    received = %response.id,
                    "response id differs from request id"
                );
            }
            response
                .into_result()
                .map_err(|message| ClientError::Remote { message })
        });

        debug!(
            target: CLIENT_TARGET,
            method,
            id = %request.id,
            elapsed = ?started.elapsed(),
            ok = outcome.is_ok(),
            "call finished"
        );
        outcome
    }

    /// Invokes `method` and decodes its result as `T`.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send), plus [`ClientError::Protocol`] when the result
    /// does not have the shape of `T`.
    pub fn send_as<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T, ClientError> {
        let value = self.send(method, params)?;
        serde_json::from_value(value).map_err(|error| {
            ClientError::protocol(format!("unexpected result for '{method}': {error}"))
        })
    }

    /// Invokes `method`, falling back to `T::default()` on any failure.
    ///
    /// The failure is logged at warn level.
    #[must_use]
    pub fn send_or_default<T: DeserializeOwned + Default>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> T {
        match self.send_as(method, params) {
            Ok(value) => value,
            Err(error) => {
                warn!(
                    target: CLIENT_TARGET,
                    method,
                    error = %error,
                    "bridge call failed; using default"
                );
                T::default()
            }
        }
    }

    fn exchange(&self, payload: &[u8], deadline: &Deadline) -> Result<Response, ClientError> {
        let budget = deadline.remaining().ok_or_else(|| self.timed_out())?;
        let connection = connect(&self.endpoint, budget).map_err(|error| {
            if error.kind() == io::ErrorKind::TimedOut {
                self.timed_out()
            } else {
                ClientError::connect(&self.endpoint, error)
            }
        })?;
        let mut call = Call::new(connection);

        let budget = deadline.remaining().ok_or_else(|| self.timed_out())?;
        call.write_request(payload, budget)
            .map_err(|error| self.io_failure(error))?;

        let line = self.read_response(&mut call, deadline)?;
        Ok(Response::decode(&line)?)
    }

    fn read_response(&self, call: &mut Call, deadline: &Deadline) -> Result<Vec<u8>, ClientError> {
        loop {
            let budget = deadline.remaining().ok_or_else(|| self.timed_out())?;
            match call.read_line(budget) {
                Ok(Some(line)) => return Ok(line),
                Ok(None) => {
                    return Err(ClientError::protocol(
                        "connection closed before a response arrived",
                    ));
                }
                Err(error) if error.is_timeout() => {}
                Err(FramingError::Io(error)) => return Err(self.io_failure(error)),
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn timed_out(&self) -> ClientError {
        ClientError::timeout(&self.endpoint, self.timeout)
    }

    fn io_failure(&self, error: io::Error) -> ClientError {
        if matches!(
            error.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ) {
            self.timed_out()
        } else {
            ClientError::transport(&self.endpoint, error)
        }
    }
}

/// Connection owned by a single call.
///
/// Dropping the call closes the connection, which happens exactly once on
/// every exit path.
struct Call {
    reader: LineReader<Connection>,
}

impl Call {
    fn new(connection: Connection) -> Self {
        Self {
            reader: LineReader::new(connection),
        }
    }

    fn write_request(&mut self, payload: &[u8], budget: Duration) -> io::Result<()> {
        let stream = self.reader.get_mut();
        stream.set_timeouts(budget)?;
        stream.write_all(payload)?;
        stream.flush()
    }

    fn read_line(&mut self, budget: Duration) -> Result<Option<Vec<u8>>, FramingError> {
        self.reader.get_ref().set_read_timeout(budget)?;
        self.reader.read_line()
    }
}

impl Drop for Call {
    fn drop(&mut self) {
        if let Err(error) = self.reader.get_ref().shutdown()
            && error.kind() != io::ErrorKind::NotConnected
        {
            debug!(target: CLIENT_TARGET, error = %error, "failed to shut connection down");
        }
    }
}

/// Fixed point in time after which a call is abandoned.
struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    /// Time left, or `None` once the deadline has passed.
    fn remaining(&self) -> Option<Duration> {
        self.budget
            .checked_sub(self.started.elapsed())
            .filter(|left| !left.is_zero())
    }
}

/// Short opaque token; the daemon echoes it but nothing depends on it.
fn request_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ID_LENGTH);
    id
}

#[cfg(test)]
mod tests;

//! Connection handler that serves request lines until the peer hangs up.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use bridge_protocol::{FramingError, LineReader, MAX_LINE_BYTES, Request, Response, is_blank_line};

use crate::transport::{ConnectionHandler, ConnectionStream, ShutdownToken};

use super::DISPATCH_TARGET;
use super::registry::MethodRegistry;

/// How long an idle read blocks before the stop signal is checked again.
pub(crate) const IDLE_POLL: Duration = Duration::from_millis(100);

/// Serves request/response cycles on one connection.
///
/// Requests on a connection are handled strictly in order. A blank line or
/// the end of the stream closes the connection without a reply. A stop
/// request is honoured only between requests, so a request already being
/// received or dispatched is always answered.
#[derive(Debug, Clone)]
pub struct DispatchConnectionHandler {
    registry: Arc<MethodRegistry>,
    idle_poll: Duration,
    max_line: usize,
}

/// Why a connection loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closed {
    Peer,
    Shutdown,
    Transport,
}

impl DispatchConnectionHandler {
    /// Creates a handler routing through `registry`.
    #[must_use]
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Self {
            registry,
            idle_poll: IDLE_POLL,
            max_line: MAX_LINE_BYTES,
        }
    }

    /// Overrides the request line limit.
    #[cfg(test)]
    pub(crate) fn with_max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line;
        self
    }

    fn serve(&self, stream: ConnectionStream, shutdown: &ShutdownToken) -> (Closed, u64) {
        if let Err(error) = stream.set_read_timeout(Some(self.idle_poll)) {
            warn!(target: DISPATCH_TARGET, %error, "failed to configure connection");
            return (Closed::Transport, 0);
        }
        let mut reader = LineReader::with_limit(stream, self.max_line);
        let mut served = 0;
        loop {
            if shutdown.is_triggered() && !reader.has_pending() {
                return (Closed::Shutdown, served);
            }
            let line = match reader.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => return (Closed::Peer, served),
                Err(error) if error.is_timeout() => continue,
                Err(error @ FramingError::TooLarge { .. }) => {
                    warn!(target: DISPATCH_TARGET, %error, "rejecting oversized request");
                    let response = Response::failure("", error.to_string());
                    if let Err(write_error) = write_response(reader.get_mut(), &response) {
                        debug!(target: DISPATCH_TARGET, error = %write_error, "failed to report oversized request");
                    }
                    return (Closed::Transport, served);
                }
                Err(error) => {
                    debug!(target: DISPATCH_TARGET, %error, "connection read failed");
                    return (Closed::Transport, served);
                }
            };
            if is_blank_line(&line) {
                return (Closed::Peer, served);
            }

            let response = self.respond(&line);
            if let Err(error) = write_response(reader.get_mut(), &response) {
                warn!(target: DISPATCH_TARGET, %error, "failed to write response");
                return (Closed::Transport, served);
            }
            served += 1;
        }
    }

    /// Produces the response for one request line.
    fn respond(&self, line: &[u8]) -> Response {
        let started = Instant::now();
        let request = match Request::decode(line) {
            Ok(request) => request,
            Err(error) => {
                debug!(target: DISPATCH_TARGET, %error, "malformed request");
                return Response::failure("", error.to_string());
            }
        };
        let Request { method, params, id } = request;
        let outcome = self.registry.dispatch(&method, params);
        let elapsed = started.elapsed();
        match outcome {
            Ok(result) => {
                debug!(
                    target: DISPATCH_TARGET,
                    method = %method,
                    id = %id,
                    elapsed = ?elapsed,
                    "request served"
                );
                Response::success(id, result)
            }
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    method = %method,
                    id = %id,
                    elapsed = ?elapsed,
                    %error,
                    "request failed"
                );
                Response::failure(id, error.to_string())
            }
        }
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, stream: ConnectionStream, shutdown: &ShutdownToken) {
        let (closed, served) = self.serve(stream, shutdown);
        debug!(target: DISPATCH_TARGET, ?closed, served, "connection closed");
    }
}

fn write_response(stream: &mut ConnectionStream, response: &Response) -> io::Result<()> {
    let line = response.encode().map_err(io::Error::other)?;
    stream.write_all(&line)?;
    stream.flush()
}

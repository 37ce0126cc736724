//! Listener implementation for the daemon endpoint.

#[cfg(test)]
use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use bridge_config::SocketEndpoint;

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError, ShutdownToken};

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::Path;

/// Pause between polls while no client is waiting.
const ACCEPT_POLL: Duration = Duration::from_millis(25);
/// Pause after a failed accept before trying again.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Listener bound to the daemon endpoint but not yet accepting.
#[derive(Debug)]
pub struct SocketListener {
    endpoint: SocketEndpoint,
    listener: ListenerKind,
    error_backoff: Duration,
    #[cfg(test)]
    accept_faults: VecDeque<io::ErrorKind>,
}

#[derive(Debug)]
enum ListenerKind {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl SocketListener {
    /// Binds `endpoint`.
    ///
    /// A leftover Unix socket file from a crashed daemon is removed first; a
    /// socket that still answers is reported as in use.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the address cannot be resolved or bound.
    pub fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        let listener = match endpoint {
            SocketEndpoint::Tcp { host, port } => ListenerKind::Tcp(bind_tcp(host, *port)?),
            SocketEndpoint::Unix { path } => {
                #[cfg(unix)]
                {
                    ListenerKind::Unix(bind_unix(path.as_std_path())?)
                }

                #[cfg(not(unix))]
                {
                    let _ = path;
                    return Err(ListenerError::UnsupportedUnix {
                        endpoint: endpoint.to_string(),
                    });
                }
            }
        };
        Ok(Self {
            endpoint: endpoint.clone(),
            listener,
            error_backoff: ERROR_BACKOFF,
            #[cfg(test)]
            accept_faults: VecDeque::new(),
        })
    }

    /// Makes the next accepts fail with `faults`, in order, before the socket
    /// is consulted, and shortens the pause after each failure to `backoff`.
    #[cfg(test)]
    pub(crate) fn with_accept_faults(
        mut self,
        faults: impl IntoIterator<Item = io::ErrorKind>,
        backoff: Duration,
    ) -> Self {
        self.accept_faults.extend(faults);
        self.error_backoff = backoff;
        self
    }

    /// Endpoint this listener is bound to.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Actual TCP address, useful when binding port `0`.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.listener {
            ListenerKind::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            ListenerKind::Unix(_) => None,
        }
    }

    /// Starts accepting on a background thread and returns immediately.
    ///
    /// Every accepted connection is served by `handler` on its own thread.
    /// There is no limit on the number of simultaneous connections.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the listener cannot be made non-blocking
    /// or the accept thread cannot be spawned. The Unix socket file is removed
    /// in both cases.
    pub fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = match &self.listener {
            ListenerKind::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            ListenerKind::Unix(listener) => listener.set_nonblocking(true),
        } {
            self.release();
            return Err(ListenerError::NonBlocking { source });
        }

        let shutdown = ShutdownToken::new();
        let loop_shutdown = shutdown.clone();
        let endpoint = self.endpoint.clone();
        let dispatch = tracing::dispatcher::get_default(Clone::clone);
        let worker = thread::Builder::new()
            .name("bridge-accept".to_owned())
            .spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    self.run_accept_loop(&loop_shutdown, &handler);
                });
            })
            .map_err(|source| {
                #[cfg(unix)]
                cleanup_unix_socket(&endpoint);
                ListenerError::Spawn { source }
            })?;

        Ok(ListenerHandle {
            shutdown,
            worker: Some(worker),
        })
    }

    fn run_accept_loop(mut self, shutdown: &ShutdownToken, handler: &Arc<dyn ConnectionHandler>) {
        info!(
            target: LISTENER_TARGET,
            endpoint = %self.endpoint,
            "socket listener active"
        );
        let mut accepted: u64 = 0;
        let mut failed: u64 = 0;
        let mut consecutive_errors: u32 = 0;
        while !shutdown.is_triggered() {
            match self.accept_connection() {
                Ok(Some(stream)) => {
                    consecutive_errors = 0;
                    accepted += 1;
                    spawn_connection(accepted, stream, handler, shutdown);
                }
                Ok(None) => {
                    shutdown.sleep(ACCEPT_POLL);
                }
                Err(error) => {
                    failed += 1;
                    consecutive_errors = consecutive_errors.saturating_add(1);
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        consecutive_errors,
                        backoff_ms = self.error_backoff.as_millis(),
                        "socket accept error"
                    );
                    shutdown.sleep(self.error_backoff);
                }
            }
        }

        info!(
            target: LISTENER_TARGET,
            endpoint = %self.endpoint,
            accepted,
            failed,
            "socket listener stopped"
        );
        self.release();
    }

    fn accept_connection(&mut self) -> Result<Option<ConnectionStream>, io::Error> {
        #[cfg(test)]
        if let Some(kind) = self.accept_faults.pop_front() {
            return Err(io::Error::new(kind, "injected accept failure"));
        }
        let accepted = match &self.listener {
            ListenerKind::Tcp(tcp) => tcp
                .accept()
                .map(|(stream, _)| ConnectionStream::Tcp(stream)),
            #[cfg(unix)]
            ListenerKind::Unix(unix) => unix
                .accept()
                .map(|(stream, _)| ConnectionStream::Unix(stream)),
        };
        match accepted {
            Ok(stream) => {
                stream.set_nonblocking(false)?;
                Ok(Some(stream))
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Drops the listening socket and removes its file, if any.
    fn release(self) {
        #[cfg(unix)]
        cleanup_unix_socket(&self.endpoint);
        drop(self.listener);
    }
}

fn spawn_connection(
    sequence: u64,
    stream: ConnectionStream,
    handler: &Arc<dyn ConnectionHandler>,
    shutdown: &ShutdownToken,
) {
    let handler = Arc::clone(handler);
    let shutdown = shutdown.clone();
    let spawned = thread::Builder::new()
        .name(format!("bridge-conn-{sequence}"))
        .spawn(move || handler.handle(stream, &shutdown));
    match spawned {
        Ok(_) => debug!(target: LISTENER_TARGET, connection = sequence, "connection accepted"),
        Err(error) => warn!(
            target: LISTENER_TARGET,
            connection = sequence,
            error = %error,
            "failed to spawn connection thread; dropping connection"
        ),
    }
}

/// Handle to a running listener.
///
/// Dropping the handle raises the stop signal without waiting for the accept
/// thread; call [`join`](ListenerHandle::join) to wait.
#[derive(Debug)]
pub struct ListenerHandle {
    shutdown: ShutdownToken,
    worker: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept loop and idle connections to stop.
    ///
    /// Connections finish the request they are serving and close at their
    /// next read. Calling this more than once is harmless.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    /// Clone of the stop signal shared with the accept loop.
    #[must_use]
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    /// Returns true once [`stop`](ListenerHandle::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Waits for the accept thread to exit.
    ///
    /// Connection threads are not joined; they drain on their own.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the accept thread panicked.
    pub fn join(mut self) -> Result<(), ListenerError> {
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_owned(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}

#[cfg(unix)]
fn bind_unix(path: &Path) -> Result<UnixListener, ListenerError> {
    if path.exists() {
        remove_stale_socket(path)?;
    }

    UnixListener::bind(path).map_err(|source| ListenerError::BindUnix {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(unix)]
fn remove_stale_socket(path: &Path) -> Result<(), ListenerError> {
    let metadata = fs::symlink_metadata(path).map_err(|source| ListenerError::UnixMetadata {
        path: path.display().to_string(),
        source,
    })?;
    if !metadata.file_type().is_socket() {
        return Err(ListenerError::UnixNotSocket {
            path: path.display().to_string(),
        });
    }
    match UnixStream::connect(path) {
        Ok(_live) => Err(ListenerError::UnixInUse {
            path: path.display().to_string(),
        }),
        Err(error)
            if matches!(
                error.kind(),
                io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
            ) =>
        {
            fs::remove_file(path).map_err(|source| ListenerError::UnixCleanup {
                path: path.display().to_string(),
                source,
            })
        }
        Err(source) => Err(ListenerError::UnixConnect {
            path: path.display().to_string(),
            source,
        }),
    }
}

#[cfg(unix)]
fn cleanup_unix_socket(endpoint: &SocketEndpoint) {
    let Some(path) = endpoint.unix_path() else {
        return;
    };
    if let Err(error) = fs::remove_file(path.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: LISTENER_TARGET,
            error = %error,
            path = %path,
            "failed to remove unix socket file"
        );
    }
}

//! Shared collaborators for the daemon test suites.

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use bridge_config::{Config, SocketEndpoint};

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::health::HealthReporter;
use crate::process::{ShutdownError, ShutdownSignal};

/// Loader that places the daemon socket in a temporary directory.
pub struct TestConfigLoader {
    dir: TempDir,
}

impl TestConfigLoader {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    pub fn socket_path(&self) -> PathBuf {
        self.dir.path().join("run").join("bridge.sock")
    }

    pub fn endpoint(&self) -> SocketEndpoint {
        SocketEndpoint::unix(self.socket_path().to_str().expect("utf8 path").to_owned())
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config::with_socket(self.endpoint()))
    }
}

/// Loader that always fails to parse its arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("bridged"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}

/// Reporter that records event names in order.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingHealthReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().expect("events lock").push(event.into());
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record("bootstrap_starting");
    }

    fn bootstrap_succeeded(&self, _config: &Config, _methods: usize) {
        self.record("bootstrap_succeeded");
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        let stage = match error {
            BootstrapError::Configuration { .. } => "configuration",
            BootstrapError::Telemetry { .. } => "telemetry",
            BootstrapError::Socket { .. } => "socket",
        };
        self.record(format!("bootstrap_failed:{stage}"));
    }

    fn listener_ready(&self, _endpoint: &SocketEndpoint) {
        self.record("listener_ready");
    }

    fn listener_stopped(&self, _endpoint: &SocketEndpoint) {
        self.record("listener_stopped");
    }
}

/// Shutdown signal released by the test through a channel.
pub struct ChannelShutdown {
    receiver: Mutex<Receiver<()>>,
}

impl ChannelShutdown {
    pub fn new() -> (Sender<()>, Self) {
        let (sender, receiver) = channel();
        (
            sender,
            Self {
                receiver: Mutex::new(receiver),
            },
        )
    }
}

impl ShutdownSignal for ChannelShutdown {
    fn wait(&self) -> Result<(), ShutdownError> {
        let receiver = self.receiver.lock().expect("receiver lock");
        // A dropped sender also releases the daemon.
        receiver.recv().ok();
        Ok(())
    }
}

/// Writes one request line and reads one response line.
pub fn exchange<S: Read + Write>(stream: &mut S, request: &str) -> String {
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().expect("flush");
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response");
    line
}

/// Read timeout applied to raw test clients.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Strips surrounding double quotes from a captured step argument.
pub fn strip_quotes(value: &str) -> &str {
    value.trim_matches('"')
}

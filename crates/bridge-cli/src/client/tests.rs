use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bridge_config::SocketEndpoint;
use bridged::backend::{InMemoryBackend, InterfaceMap};
use bridged::transport::ListenerHandle;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;

const SHORT_TIMEOUT: Duration = Duration::from_millis(200);

struct Daemon {
    endpoint: SocketEndpoint,
    handle: ListenerHandle,
}

impl Daemon {
    fn client(&self) -> IpcClient {
        IpcClient::new(self.endpoint.clone())
    }
}

#[fixture]
fn daemon() -> Daemon {
    let backend = Arc::new(InMemoryBackend::new().with_network_interfaces(InterfaceMap::new()));
    let (endpoint, handle) =
        bridged::serve(&SocketEndpoint::tcp("127.0.0.1", 0), backend).expect("serve");
    Daemon { endpoint, handle }
}

/// Accepts one connection, records the request line, and answers with
/// `reply` before closing.
fn scripted_server(reply: &'static [u8]) -> (SocketEndpoint, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let worker = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut request = String::new();
        reader.read_line(&mut request).expect("request line");
        let mut writer = stream;
        writer.write_all(reply).expect("reply");
        request
    });
    (SocketEndpoint::tcp("127.0.0.1", port), worker)
}

fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("local addr").port()
}

#[rstest]
fn resolves_with_the_result_value(daemon: Daemon) {
    let result = daemon
        .client()
        .send("connect", Some(json!("srv-missing")))
        .expect("call succeeds");
    assert_eq!(result, Value::Bool(false));
}

#[test]
fn void_results_resolve_as_null() {
    let (endpoint, server) = scripted_server(b"{\"id\":\"x\"}\n");
    let result = IpcClient::new(endpoint)
        .send("reloadServers", None)
        .expect("reload");
    assert_eq!(result, Value::Null);
    server.join().expect("server thread");
}

#[rstest]
fn remote_errors_carry_the_daemon_message(daemon: Daemon) {
    let error = daemon.client().send("bogus", None).expect_err("unknown method");
    match error {
        ClientError::Remote { message } => assert_eq!(message, "Method 'bogus' not found"),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[rstest]
fn typed_calls_decode_the_result(daemon: Daemon) {
    let tags: Vec<String> = daemon.client().send_as("getTags", None).expect("tags");
    assert!(tags.is_empty());
}

#[rstest]
fn typed_calls_reject_results_of_the_wrong_shape(daemon: Daemon) {
    let error = daemon
        .client()
        .send_as::<Vec<String>>("getGeneralSettings", None)
        .expect_err("settings are not a list");
    assert!(matches!(error, ClientError::Protocol { .. }), "{error:?}");
}

#[rstest]
fn concurrent_calls_each_get_their_own_answer(daemon: Daemon) {
    let client = daemon.client();
    let workers: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            thread::spawn(move || client.send_as::<Vec<String>>("getTags", None))
        })
        .collect();
    for worker in workers {
        let tags = worker.join().expect("worker").expect("call");
        assert!(tags.is_empty());
    }
}

#[rstest]
fn calls_fail_once_the_daemon_stops(daemon: Daemon) {
    let client = daemon.client();
    daemon.handle.stop();
    daemon.handle.join().expect("join");
    let error = client.send("getTags", None).expect_err("daemon gone");
    assert!(matches!(error, ClientError::Connect { .. }), "{error:?}");
}

#[test]
fn unreachable_endpoints_fail_to_connect() {
    let client = IpcClient::new(SocketEndpoint::tcp("127.0.0.1", unused_port()));
    let error = client.send("getTags", None).expect_err("nothing listening");
    assert!(matches!(error, ClientError::Connect { .. }), "{error:?}");
}

#[test]
fn send_or_default_degrades_to_the_default() {
    let client = IpcClient::new(SocketEndpoint::tcp("127.0.0.1", unused_port()));
    let servers: Vec<Value> = client.send_or_default("getServers", None);
    assert!(servers.is_empty());
}

#[test]
fn silent_daemon_times_out_and_the_connection_is_closed() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");
        let mut received = Vec::new();
        stream
            .read_to_end(&mut received)
            .expect("client closes the stream");
        received
    });

    let client = IpcClient::with_timeout(SocketEndpoint::tcp("127.0.0.1", port), SHORT_TIMEOUT);
    let started = Instant::now();
    let error = client.send("getServers", None).expect_err("no reply");
    assert!(error.is_timeout(), "{error:?}");
    assert!(started.elapsed() < Duration::from_secs(2));

    let received = server.join().expect("server thread");
    assert_eq!(received.iter().filter(|byte| **byte == b'\n').count(), 1);
}

#[test]
fn request_lines_carry_method_params_and_an_eight_character_id() {
    let (endpoint, server) = scripted_server(b"{\"id\":\"x\",\"result\":true}\n");
    let client = IpcClient::new(endpoint);
    client
        .send("deleteServer", Some(json!("srv-1")))
        .expect("call");

    let line = server.join().expect("server thread");
    let request: Value = serde_json::from_str(&line).expect("request json");
    assert_eq!(request["method"], "deleteServer");
    assert_eq!(request["params"], "srv-1");
    let id = request["id"].as_str().expect("string id");
    assert_eq!(id.len(), 8);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn mismatched_response_ids_are_tolerated() {
    let (endpoint, server) = scripted_server(b"{\"id\":\"someone-else\",\"result\":7}\n");
    let result = IpcClient::new(endpoint).send("getTags", None).expect("call");
    assert_eq!(result, json!(7));
    server.join().expect("server thread");
}

#[test]
fn error_takes_precedence_over_result() {
    let (endpoint, server) =
        scripted_server(b"{\"Id\":\"x\",\"Result\":1,\"Error\":\"Server not found\"}\n");
    let error = IpcClient::new(endpoint)
        .send("getServer", Some(json!("x")))
        .expect_err("error wins");
    assert_eq!(error.to_string(), "Server not found");
    server.join().expect("server thread");
}

#[rstest]
#[case::not_json(b"definitely not json\n")]
#[case::not_an_object(b"[1,2,3]\n")]
#[case::closed_without_reply(b"")]
#[case::unterminated(b"{\"id\":\"x\",\"result\":")]
fn undecodable_replies_are_protocol_errors(#[case] reply: &'static [u8]) {
    let (endpoint, server) = scripted_server(reply);
    let error = IpcClient::new(endpoint)
        .send("getTags", None)
        .expect_err("bad reply");
    assert!(matches!(error, ClientError::Protocol { .. }), "{error:?}");
    server.join().expect("server thread");
}

#[test]
fn request_ids_are_short_hex_tokens() {
    let first = request_id();
    let second = request_id();
    assert_eq!(first.len(), ID_LENGTH);
    assert_ne!(first, second);
}

#[test]
fn expired_deadlines_report_no_time_left() {
    let deadline = Deadline::start(Duration::ZERO);
    assert_eq!(deadline.remaining(), None);
    let generous = Deadline::start(Duration::from_secs(60));
    assert!(generous.remaining().is_some());
}

#[cfg(unix)]
#[test]
fn calls_travel_over_unix_sockets() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("bridge.sock");
    let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path").to_owned());
    let backend = Arc::new(InMemoryBackend::new());
    let (bound, handle) = bridged::serve(&endpoint, backend).expect("serve");

    let tags: Vec<String> = IpcClient::new(bound).send_as("getTags", None).expect("tags");
    assert!(tags.is_empty());

    handle.stop();
    handle.join().expect("join");
    assert!(!path.exists());
}

#[test]
fn connect_failures_name_the_endpoint() {
    let port = unused_port();
    let error = IpcClient::new(SocketEndpoint::tcp("127.0.0.1", port))
        .send("getTags", None)
        .expect_err("nothing listening");
    assert!(error.to_string().contains(&port.to_string()), "{error}");
}

#[test]
fn client_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<IpcClient>();
}

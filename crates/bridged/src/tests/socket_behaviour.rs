//! Behavioural tests for exchanges over a served TCP endpoint.

use std::cell::RefCell;
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use bridge_config::SocketEndpoint;
use bridge_protocol::Response;

use super::support::{CLIENT_TIMEOUT, exchange, strip_quotes};
use crate::backend::{InMemoryBackend, InterfaceMap, ServerForm};
use crate::transport::ListenerHandle;

type StepResult = Result<(), String>;

struct Served {
    backend: Arc<InMemoryBackend>,
    port: u16,
    handle: ListenerHandle,
}

impl Served {
    fn start() -> Self {
        let backend =
            Arc::new(InMemoryBackend::new().with_network_interfaces(InterfaceMap::new()));
        let (bound, handle) =
            crate::serve(&SocketEndpoint::tcp("127.0.0.1", 0), backend.clone()).expect("serve");
        let SocketEndpoint::Tcp { port, .. } = bound else {
            panic!("expected a tcp endpoint, got {bound}");
        };
        Self {
            backend,
            port,
            handle,
        }
    }

    fn call(&self, request: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", self.port)).expect("connect");
        stream
            .set_read_timeout(Some(CLIENT_TIMEOUT))
            .expect("read timeout");
        exchange(&mut stream, request)
    }
}

#[derive(Default)]
struct SocketWorld {
    served: Option<Arc<Served>>,
    replies: Vec<String>,
    concurrent: Vec<(String, Response)>,
}

impl SocketWorld {
    fn served(&self) -> Result<&Arc<Served>, String> {
        self.served
            .as_ref()
            .ok_or_else(|| "no daemon is serving".to_owned())
    }

    fn last_reply(&self) -> Result<&str, String> {
        self.replies
            .last()
            .map(String::as_str)
            .ok_or_else(|| "no reply received".to_owned())
    }
}

impl Drop for SocketWorld {
    fn drop(&mut self) {
        if let Some(served) = self.served.take() {
            served.handle.stop();
        }
    }
}

#[fixture]
fn world() -> RefCell<SocketWorld> {
    RefCell::new(SocketWorld::default())
}

#[given("a bridge daemon is serving on TCP")]
fn given_serving(world: &RefCell<SocketWorld>) {
    world.borrow_mut().served = Some(Arc::new(Served::start()));
}

#[given(r#"the backend holds a server named "{name}""#)]
fn given_seeded_server(world: &RefCell<SocketWorld>, name: String) -> StepResult {
    let world = world.borrow();
    world
        .served()?
        .backend
        .seed(
            ServerForm {
                protocol: "SSH".to_owned(),
                display_name: strip_quotes(&name).to_owned(),
                ..ServerForm::default()
            },
            vec!["prod".to_owned()],
            None,
        )
        .map(drop)
        .map_err(|error| error.to_string())
}

#[when(r#"a client sends "{request}""#)]
fn when_client_sends(world: &RefCell<SocketWorld>, request: String) -> StepResult {
    let reply = world
        .borrow()
        .served()?
        .call(&format!("{}\n", strip_quotes(&request)));
    world.borrow_mut().replies.push(reply);
    Ok(())
}

#[when("{count} clients request dashboard stats at once")]
fn when_concurrent_clients(world: &RefCell<SocketWorld>, count: usize) -> StepResult {
    let served = Arc::clone(world.borrow().served()?);
    let workers: Vec<_> = (0..count)
        .map(|n| {
            let served = Arc::clone(&served);
            thread::spawn(move || {
                let id = format!("call-{n}");
                let request =
                    json!({"method": "getDashboardStats", "id": id.as_str()}).to_string() + "\n";
                let line = served.call(&request);
                let response = Response::decode(line.as_bytes()).expect("decode");
                (id, response)
            })
        })
        .collect();
    let results = workers
        .into_iter()
        .map(|worker| worker.join().map_err(|_| "client thread panicked".to_owned()))
        .collect::<Result<Vec<_>, _>>()?;
    world.borrow_mut().concurrent = results;
    Ok(())
}

#[when("the listener is stopped")]
fn when_listener_stopped(world: &RefCell<SocketWorld>) -> StepResult {
    let world = world.borrow();
    let served = world.served()?;
    served.handle.stop();
    assert!(served.handle.is_stopped());
    Ok(())
}

#[then(r#"the reply is "{reply}""#)]
fn then_reply_is(world: &RefCell<SocketWorld>, reply: String) -> StepResult {
    let world = world.borrow();
    let expected = format!("{}\n", strip_quotes(&reply));
    let actual = world.last_reply()?;
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected:?}, got {actual:?}"))
    }
}

#[then("both replies are identical")]
fn then_replies_identical(world: &RefCell<SocketWorld>) {
    let world = world.borrow();
    assert_eq!(world.replies.len(), 2, "expected two replies");
    assert_eq!(world.replies[0], world.replies[1]);
}

#[then("every client received its own id")]
fn then_own_ids(world: &RefCell<SocketWorld>) {
    let concurrent = std::mem::take(&mut world.borrow_mut().concurrent);
    assert!(!concurrent.is_empty(), "no concurrent replies recorded");
    for (id, response) in concurrent {
        assert_eq!(response.id, id);
        let result = response.into_result().expect("success");
        assert_eq!(result["totalServers"], Value::from(0));
    }
}

#[then(r#"the listed server is "{name}" at "{host}""#)]
fn then_listed_server(world: &RefCell<SocketWorld>, name: String, host: String) -> StepResult {
    let world = world.borrow();
    let servers = Response::decode(world.last_reply()?.as_bytes())
        .map_err(|error| error.to_string())?
        .into_result()
        .map_err(|error| format!("listing failed: {error:?}"))?;
    assert_eq!(servers[0]["displayName"], strip_quotes(&name));
    assert_eq!(servers[0]["subTitle"], strip_quotes(&host));
    Ok(())
}

#[then("new connections are refused")]
fn then_connections_refused(world: &RefCell<SocketWorld>) -> StepResult {
    let served = world
        .borrow_mut()
        .served
        .take()
        .ok_or_else(|| "no daemon is serving".to_owned())?;
    let port = served.port;
    let served =
        Arc::try_unwrap(served).map_err(|_| "daemon handle is still shared".to_owned())?;
    served.handle.join().map_err(|error| error.to_string())?;
    assert!(TcpStream::connect(("127.0.0.1", port)).is_err());
    Ok(())
}

#[scenario(
    path = "tests/features/daemon_socket.feature",
    name = "Unknown methods yield an error without a result"
)]
fn unknown_method(world: RefCell<SocketWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_socket.feature",
    name = "Connecting to a missing server reports false"
)]
fn connect_to_missing_server(world: RefCell<SocketWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_socket.feature",
    name = "Repeated reads without mutation agree"
)]
fn repeated_reads(world: RefCell<SocketWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_socket.feature",
    name = "Concurrent clients each get their own id"
)]
fn concurrent_clients(world: RefCell<SocketWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_socket.feature",
    name = "Mutations are visible to later connections"
)]
fn mutations_are_visible(world: RefCell<SocketWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_socket.feature",
    name = "A stopped listener refuses new connections"
)]
fn stopped_listener(world: RefCell<SocketWorld>) {
    drop(world);
}

//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use multiroute::config::{load_config_str, AppConfig};
use multiroute::lifecycle::Shutdown;
use multiroute::routing::{
    handler_fn, Arguments, Handler, HandlerResult, Outcome, Route, RouteSlot, SharedPattern,
};
use multiroute::HttpServer;

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<AppConfig>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server for `toml` on 127.0.0.1 with a random port.
pub async fn start_server(toml: &str) -> TestServer {
    let config = load_config_str(toml).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        shutdown,
        config_updates,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Handler that responds with a value from `table` or declines.
pub fn lookup_view(
    name: &'static str,
    label: &'static str,
    table: &'static [(&'static str, &'static str)],
) -> Arc<dyn Handler<RouteSlot, String>> {
    handler_fn(name, move |_: &mut RouteSlot, args: &Arguments| {
        let key = args.get("0").or_else(|| args.get("name")).unwrap_or_default();
        match table.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => Ok(Outcome::Respond(format!("{}: {}", label, value))),
            None => Ok(Outcome::Decline),
        }
    })
}

pub const PEOPLE: &[(&str, &str)] = &[("john", "John Smith"), ("jane", "Jane Doe")];
pub const PLACES: &[(&str, &str)] = &[("sf", "San Francisco"), ("nyc", "New York City")];

pub fn person() -> Arc<dyn Handler<RouteSlot, String>> {
    lookup_view("views::person", "Person", PEOPLE)
}

pub fn place() -> Arc<dyn Handler<RouteSlot, String>> {
    lookup_view("views::place", "Place", PLACES)
}

/// Catch-all view: title-cases whatever it was given.
pub fn thing() -> Arc<dyn Handler<RouteSlot, String>> {
    handler_fn("views::thing", |_: &mut RouteSlot, args: &Arguments| {
        let name = args.get("0").or_else(|| args.get("name")).unwrap_or_default();
        let mut chars = name.chars();
        let titled = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        };
        Ok(Outcome::Respond(format!("Thing: {}", titled)))
    })
}

/// `^(\w+)/$` route named `name`.
pub fn word_route(handler: Arc<dyn Handler<RouteSlot, String>>, name: &str) -> SharedPattern<RouteSlot, String> {
    Route::regex(r"^(\w+)/$", handler).unwrap().name(name).into_shared()
}

/// Records every invocation by name.
#[derive(Default, Clone)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
    total: Arc<AtomicUsize>,
}

impl CallLog {
    pub fn handler(
        &self,
        name: &'static str,
        result: fn() -> HandlerResult<String>,
    ) -> Arc<dyn Handler<RouteSlot, String>> {
        let log = self.clone();
        handler_fn(name, move |_: &mut RouteSlot, _: &Arguments| {
            log.calls.lock().unwrap().push(name.to_string());
            log.total.fetch_add(1, Ordering::SeqCst);
            result()
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

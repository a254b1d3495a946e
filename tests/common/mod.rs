//! Shared utilities for relay integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;

use ohttp_relay::config::{GatewayConfig, RelayConfig};
use ohttp_relay::lifecycle::{Relay, Shutdown};
use ohttp_relay::GatewayClient;

pub const OHTTP_REQ: &str = "message/ohttp-req";
pub const OHTTP_RES: &str = "message/ohttp-res";

/// What the mock gateway answers for a given request body.
pub type Responder = Arc<dyn Fn(&[u8]) -> (StatusCode, &'static str, Vec<u8>) + Send + Sync>;

/// Answers with an encapsulated response half the size of the request.
pub fn halving_responder() -> Responder {
    Arc::new(|body| (StatusCode::OK, OHTTP_RES, vec![0xab; body.len() / 2]))
}

/// Answers with a fixed status, content type and body.
pub fn fixed_responder(status: StatusCode, content_type: &'static str, body: &'static [u8]) -> Responder {
    Arc::new(move |_| (status, content_type, body.to_vec()))
}

/// In-process gateway that counts calls and tracks concurrency.
#[derive(Clone)]
pub struct MockGateway {
    pub addr: SocketAddr,
    pub calls: Arc<AtomicUsize>,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
    pub delay_ms: Arc<AtomicU64>,
    pub last_headers: Arc<Mutex<Vec<String>>>,
    responder: Responder,
}

impl MockGateway {
    pub async fn start(responder: Responder) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let gateway = Self {
            addr: listener.local_addr().unwrap(),
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            delay_ms: Arc::new(AtomicU64::new(0)),
            last_headers: Arc::new(Mutex::new(Vec::new())),
            responder,
        };

        let app = Router::new()
            .route("/gateway", post(mock_handler))
            .with_state(gateway.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        gateway
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/gateway", self.addr)
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn mock_handler(State(gateway): State<MockGateway>, headers: HeaderMap, body: Bytes) -> Response {
    gateway.calls.fetch_add(1, Ordering::SeqCst);
    let now = gateway.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    gateway.max_in_flight.fetch_max(now, Ordering::SeqCst);
    let _guard = InFlight(gateway.in_flight.clone());

    {
        let mut names: Vec<String> = headers.keys().map(|k| k.as_str().to_string()).collect();
        names.sort();
        *gateway.last_headers.lock().unwrap() = names;
    }

    let delay = gateway.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let (status, content_type, reply) = (gateway.responder)(&body);
    (status, [(CONTENT_TYPE, content_type)], reply).into_response()
}

/// Relay config with one gateway named `g1` and fast-failing timeouts.
pub fn relay_config(endpoint: &str) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.retries.base_delay_ms = 5;
    config.retries.max_delay_ms = 20;
    config.timeouts.connect_ms = 500;
    config.gateways.push(GatewayConfig::new("g1", endpoint));
    config
}

/// A relay serving in the background.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub gateway: Arc<GatewayClient>,
    pub shutdown: Shutdown,
    pub http: reqwest::Client,
}

impl RunningRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST an encapsulated request to `g1` through the path selector.
    pub async fn post_g1(&self, body: Vec<u8>) -> reqwest::Response {
        self.http
            .post(self.url("/gateway/g1"))
            .header(CONTENT_TYPE, OHTTP_REQ)
            .body(body)
            .send()
            .await
            .unwrap()
    }
}

pub async fn start_relay(config: RelayConfig) -> RunningRelay {
    let relay = Relay::build(config).unwrap();
    let listener = relay.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    let gateway = relay.gateway().clone();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = relay.serve(listener, server_shutdown).await;
    });

    RunningRelay {
        addr,
        gateway,
        shutdown,
        http: reqwest::Client::new(),
    }
}

/// Raw HTTP/1.1 gateway that answers one request per connection with a
/// keep-alive response, then closes the socket anyway.
///
/// Returns the endpoint and a counter of accepted connections.
pub async fn start_closing_gateway() -> (String, Arc<AtomicUsize>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                if read_request(&mut socket).await.is_none() {
                    return;
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: 4\r\n\r\nabcd",
                    OHTTP_RES
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    // Read one request: headers, then Content-Length bytes of body.
    async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<()> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let length: usize = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return Some(());
                }
            }
        }
    }

    (format!("http://{}/gateway", addr), accepted)
}

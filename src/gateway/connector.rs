//! Dialling gateway connections.
//!
//! # Responsibilities
//! - TCP connect to the gateway endpoint
//! - TLS handshake for https endpoints
//! - HTTP/1.1 client handshake and connection driver task
//!
//! Each call produces exactly one connection; retries and deadlines belong
//! to the caller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_rustls::TlsConnector;
use url::Host;

use crate::gateway::tls::{server_name, TlsError};
use crate::observability::metrics;
use crate::routing::GatewayTarget;

/// A single connection attempt failed.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    #[error("TCP connect failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("HTTP handshake failed: {0}")]
    Handshake(#[from] hyper::Error),
}

impl From<TlsError> for ConnectError {
    fn from(err: TlsError) -> Self {
        ConnectError::Tls(err.to_string())
    }
}

/// Open-connection counter shared by a pool and its connections.
#[derive(Debug)]
pub struct OpenConnections {
    gateway: String,
    count: AtomicUsize,
}

impl OpenConnections {
    pub fn new(gateway: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into(),
            count: AtomicUsize::new(0),
        }
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    fn track(self: &Arc<Self>) -> OpenConnectionGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        metrics::connection_opened(&self.gateway);
        OpenConnectionGuard {
            counter: Arc::clone(self),
        }
    }
}

/// Decrements the open count when its connection is dropped.
#[derive(Debug)]
struct OpenConnectionGuard {
    counter: Arc<OpenConnections>,
}

impl Drop for OpenConnectionGuard {
    fn drop(&mut self) {
        self.counter.count.fetch_sub(1, Ordering::SeqCst);
        metrics::connection_closed(&self.counter.gateway);
    }
}

/// An established HTTP/1.1 connection to a gateway.
///
/// Dropping it closes the underlying socket.
#[derive(Debug)]
pub struct GatewayConnection {
    sender: SendRequest<Body>,
    idle_since: Instant,
    _open: OpenConnectionGuard,
}

impl GatewayConnection {
    pub fn sender_mut(&mut self) -> &mut SendRequest<Body> {
        &mut self.sender
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub fn idle_since(&self) -> Instant {
        self.idle_since
    }

    pub(crate) fn mark_idle(&mut self) {
        self.idle_since = Instant::now();
    }
}

/// Dials gateway endpoints over TCP or TLS.
#[derive(Clone, Default)]
pub struct Connector {
    tls: Option<TlsConnector>,
}

impl Connector {
    /// Plain-TCP connector; https endpoints will fail to connect.
    pub fn plain() -> Self {
        Self { tls: None }
    }

    pub fn with_tls(tls: TlsConnector) -> Self {
        Self { tls: Some(tls) }
    }

    /// Open one connection to `target`.
    pub async fn connect(
        &self,
        target: &GatewayTarget,
        open: &Arc<OpenConnections>,
    ) -> Result<GatewayConnection, ConnectError> {
        let endpoint = &target.endpoint;
        let host = match endpoint.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(ConnectError::Endpoint("missing host".into())),
        };
        let port = endpoint
            .port_or_known_default()
            .ok_or_else(|| ConnectError::Endpoint("missing port".into()))?;

        let stream = TcpStream::connect((host.as_str(), port)).await?;
        stream.set_nodelay(true)?;

        let sender = match endpoint.scheme() {
            "https" => {
                let tls = self
                    .tls
                    .as_ref()
                    .ok_or_else(|| ConnectError::Tls("TLS not configured".into()))?;
                let stream = tls
                    .connect(server_name(&host)?, stream)
                    .await
                    .map_err(|e| ConnectError::Tls(e.to_string()))?;
                handshake(stream, &target.name).await?
            }
            _ => handshake(stream, &target.name).await?,
        };

        tracing::debug!(gateway = %target.name, "Gateway connection established");

        Ok(GatewayConnection {
            sender,
            idle_since: Instant::now(),
            _open: open.track(),
        })
    }
}

async fn handshake<T>(io: T, gateway: &str) -> Result<SendRequest<Body>, hyper::Error>
where
    T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let (sender, connection) = http1::handshake(TokioIo::new(io)).await?;

    let gateway = gateway.to_string();
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!(gateway = %gateway, error = %e, "Gateway connection ended with error");
        }
    });

    Ok(sender)
}

//! Gateway client subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding engine
//!     → client.rs lease(target)
//!         → pool.rs (wait for a slot, bounded by queue wait)
//!         → pool.rs idle list, or connector.rs dial (tls.rs for https)
//!     → client.rs send(lease, body)   [exchange deadline]
//!     → client.rs release(lease)      (clean → idle list, else closed)
//! ```
//!
//! # Design Decisions
//! - Pool size bounds open connections, not just in-flight requests
//! - Connect-phase failures retry with backoff; sends never retry
//! - A lease that ends any way other than `release` closes its connection

pub mod client;
pub mod connector;
pub mod lease;
pub mod pool;
pub mod tls;

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;

use crate::error::RelayResult;
use crate::framing::MediaType;
use crate::routing::GatewayTarget;

pub use client::GatewayClient;
pub use lease::ConnectionLease;
pub use pool::PoolStats;

/// Body and media type to forward.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub media_type: MediaType,
    pub body: Bytes,
}

/// What the gateway answered, before any interpretation.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Outbound side of an exchange.
///
/// `GatewayClient` is the production implementation; tests substitute
/// their own to observe outbound calls.
pub trait GatewayTransport: Send + Sync + 'static {
    type Lease: Send + 'static;

    /// Check out a connection to `target`, waiting for a free slot.
    fn lease(&self, target: &Arc<GatewayTarget>) -> impl Future<Output = RelayResult<Self::Lease>> + Send;

    /// Send one request on the lease and read the full response.
    fn send(
        &self,
        lease: &mut Self::Lease,
        request: OutboundRequest,
    ) -> impl Future<Output = RelayResult<GatewayResponse>> + Send;

    /// Hand the lease back; the transport decides whether it is reusable.
    fn release(&self, lease: Self::Lease);
}

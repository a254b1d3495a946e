//! Oblivious HTTP relay library.
//!
//! The relay forwards opaque encapsulated OHTTP messages between clients
//! and configured gateways. It never inspects payloads and never reveals
//! client identity to a gateway.

pub mod config;
pub mod error;
pub mod forwarding;
pub mod framing;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::schema::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use forwarding::ForwardingEngine;
pub use gateway::{GatewayClient, GatewayTransport};
pub use http::HttpServer;
pub use lifecycle::{Relay, Shutdown};

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::framing::MediaType;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address or Unix socket).
    pub listener: ListenerConfig,

    /// Inbound route shape and target selection.
    pub routing: RoutingConfig,

    /// Body size limits.
    pub limits: LimitsConfig,

    /// Default timeouts, overridable per gateway.
    pub timeouts: TimeoutConfig,

    /// Connect-phase retry configuration.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Permitted gateway targets. Anything not listed here is unknown.
    pub gateways: Vec<GatewayConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Listen on a Unix domain socket instead of TCP.
    pub unix_socket: Option<String>,

    /// Maximum exchanges processed concurrently (backpressure).
    pub max_inflight: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            unix_socket: None,
            max_inflight: 10_000,
        }
    }
}

/// How inbound requests name their gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Relay route; the target may follow as one more path segment.
    pub path_prefix: String,

    /// Header naming the target when the path carries none.
    pub selector_header: String,

    /// Target used when neither the path nor the header names one.
    pub default_gateway: Option<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            path_prefix: "/gateway".to_string(),
            selector_header: "ohttp-gateway".to_string(),
            default_gateway: None,
        }
    }
}

/// Size limits for encapsulated messages.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound encapsulated request size in bytes.
    pub max_body_size: usize,

    /// Maximum encapsulated response size accepted from a gateway.
    pub max_response_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
            max_response_size: 1024 * 1024,
        }
    }
}

/// Timeout configuration for gateway exchanges.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Single connection attempt (TCP + TLS + handshake) in milliseconds.
    pub connect_ms: u64,

    /// Whole exchange deadline (connect + send + receive) in milliseconds.
    pub request_ms: u64,

    /// Maximum wait for a free pool slot in milliseconds.
    pub queue_wait_ms: u64,

    /// Idle pooled connections older than this are closed.
    pub idle_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 2_000,
            request_ms: 10_000,
            queue_wait_ms: 1_000,
            idle_ms: 60_000,
        }
    }
}

/// Connect-phase retry configuration.
///
/// Only connection establishment is ever retried; a message is sent at most
/// once.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total connection attempts per lease (1 = no retry).
    pub connect_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            connect_attempts: 3,
            base_delay_ms: 50,
            max_delay_ms: 500,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A permitted gateway target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Target name used by the path or header selector.
    pub name: String,

    /// Gateway endpoint URL (http or https).
    pub endpoint: String,

    /// Media types this gateway accepts.
    #[serde(default = "default_accepted_media_types")]
    pub accepted_media_types: Vec<MediaType>,

    /// Per-target request size limit; falls back to `limits.max_body_size`.
    #[serde(default)]
    pub max_body_size: Option<usize>,

    /// Maximum simultaneously open connections to this gateway.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Per-target exchange deadline; falls back to `timeouts.request_ms`.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Per-target queue wait; falls back to `timeouts.queue_wait_ms`.
    #[serde(default)]
    pub queue_wait_ms: Option<u64>,
}

impl GatewayConfig {
    /// A target with default policy.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            accepted_media_types: default_accepted_media_types(),
            max_body_size: None,
            pool_size: default_pool_size(),
            request_timeout_ms: None,
            queue_wait_ms: None,
        }
    }
}

fn default_accepted_media_types() -> Vec<MediaType> {
    vec![MediaType::Request]
}

fn default_pool_size() -> usize {
    16
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }
}

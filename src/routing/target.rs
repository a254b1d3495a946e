//! Resolved gateway target policy.

use std::time::Duration;

use url::Url;

use crate::config::{GatewayConfig, RelayConfig};
use crate::framing::{EncapsulatedMessage, MediaType};
use crate::error::{FramingFault, RelayError, RelayResult};

/// A permitted gateway with its effective policy.
///
/// Built once from configuration; global defaults are folded in so the hot
/// path never consults the raw config.
#[derive(Debug, Clone)]
pub struct GatewayTarget {
    pub name: String,
    pub endpoint: Url,
    pub accepted_media_types: Vec<MediaType>,
    pub max_body_size: usize,
    pub pool_size: usize,
    pub request_timeout: Duration,
    pub queue_wait: Duration,
}

impl GatewayTarget {
    /// Resolve a gateway entry against the global defaults.
    pub fn from_config(gateway: &GatewayConfig, config: &RelayConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            name: gateway.name.clone(),
            endpoint: Url::parse(&gateway.endpoint)?,
            accepted_media_types: gateway.accepted_media_types.clone(),
            max_body_size: gateway.max_body_size.unwrap_or(config.limits.max_body_size),
            pool_size: gateway.pool_size,
            request_timeout: Duration::from_millis(
                gateway.request_timeout_ms.unwrap_or(config.timeouts.request_ms),
            ),
            queue_wait: Duration::from_millis(
                gateway.queue_wait_ms.unwrap_or(config.timeouts.queue_wait_ms),
            ),
        })
    }

    pub fn accepts(&self, media_type: MediaType) -> bool {
        self.accepted_media_types.contains(&media_type)
    }

    /// Check a decoded message against this target's policy.
    pub fn check(&self, message: &EncapsulatedMessage) -> RelayResult<()> {
        if !self.accepts(message.media_type()) {
            return Err(RelayError::PolicyViolation);
        }
        if message.len() > self.max_body_size {
            return Err(RelayError::MalformedMessage(FramingFault::TooLarge));
        }
        Ok(())
    }

    /// Value for the outbound `Host` header.
    pub fn host_header(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Origin-form request target (path plus query).
    pub fn request_path(&self) -> String {
        match self.endpoint.query() {
            Some(query) => format!("{}?{}", self.endpoint.path(), query),
            None => self.endpoint.path().to_string(),
        }
    }
}

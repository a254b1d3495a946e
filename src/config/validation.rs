//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (default gateway exists)
//! - Validate value ranges (timeouts > 0, pools > 0)
//! - Detect duplicate gateway names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.unix_socket.is_none()
        && config.listener.bind_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("listener.bind_address", "not a socket address"));
    }
    if config.listener.max_inflight == 0 {
        errors.push(ValidationError::new("listener.max_inflight", "must be greater than 0"));
    }

    let prefix = &config.routing.path_prefix;
    if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
        errors.push(ValidationError::new(
            "routing.path_prefix",
            "must start with '/' and have no trailing '/'",
        ));
    }
    if axum::http::HeaderName::from_bytes(config.routing.selector_header.as_bytes()).is_err() {
        errors.push(ValidationError::new("routing.selector_header", "not a valid header name"));
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::new("limits.max_body_size", "must be greater than 0"));
    }
    if config.limits.max_response_size == 0 {
        errors.push(ValidationError::new("limits.max_response_size", "must be greater than 0"));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_ms", timeouts.connect_ms),
        ("timeouts.request_ms", timeouts.request_ms),
        ("timeouts.queue_wait_ms", timeouts.queue_wait_ms),
        ("timeouts.idle_ms", timeouts.idle_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }
    if config.retries.connect_attempts == 0 {
        errors.push(ValidationError::new("retries.connect_attempts", "must be at least 1"));
    }

    let mut names = HashSet::new();
    for (i, gateway) in config.gateways.iter().enumerate() {
        let field = |name: &str| format!("gateways[{}].{}", i, name);

        if gateway.name.is_empty() || gateway.name.contains('/') {
            errors.push(ValidationError::new(field("name"), "must be non-empty and contain no '/'"));
        } else if !names.insert(gateway.name.as_str()) {
            errors.push(ValidationError::new(field("name"), format!("duplicate name '{}'", gateway.name)));
        }

        match Url::parse(&gateway.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {}
            Ok(_) => errors.push(ValidationError::new(field("endpoint"), "must be an http or https URL with a host")),
            Err(e) => errors.push(ValidationError::new(field("endpoint"), e.to_string())),
        }

        if gateway.accepted_media_types.is_empty() {
            errors.push(ValidationError::new(field("accepted_media_types"), "must not be empty"));
        }
        if gateway.pool_size == 0 {
            errors.push(ValidationError::new(field("pool_size"), "must be greater than 0"));
        }
        if gateway.max_body_size == Some(0) {
            errors.push(ValidationError::new(field("max_body_size"), "must be greater than 0"));
        }
        if gateway.request_timeout_ms == Some(0) {
            errors.push(ValidationError::new(field("request_timeout_ms"), "must be greater than 0"));
        }
        if gateway.queue_wait_ms == Some(0) {
            errors.push(ValidationError::new(field("queue_wait_ms"), "must be greater than 0"));
        }
    }

    if let Some(default) = &config.routing.default_gateway {
        if !config.gateways.iter().any(|g| &g.name == default) {
            errors.push(ValidationError::new(
                "routing.default_gateway",
                format!("no gateway named '{}'", default),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::GatewayConfig;

    fn config_with(gateways: Vec<GatewayConfig>) -> RelayConfig {
        RelayConfig {
            gateways,
            ..RelayConfig::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let config = config_with(vec![GatewayConfig::new("g1", "http://127.0.0.1:9000/gateway")]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut bad_pool = GatewayConfig::new("g2", "ftp://example.com");
        bad_pool.pool_size = 0;
        let mut config = config_with(vec![
            GatewayConfig::new("g1", "http://127.0.0.1:9000"),
            GatewayConfig::new("g1", "http://127.0.0.1:9001"),
            bad_pool,
        ]);
        config.timeouts.request_ms = 0;
        config.routing.default_gateway = Some("missing".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"timeouts.request_ms"));
        assert!(fields.contains(&"gateways[1].name"));
        assert!(fields.contains(&"gateways[2].endpoint"));
        assert!(fields.contains(&"gateways[2].pool_size"));
        assert!(fields.contains(&"routing.default_gateway"));
    }

    #[test]
    fn test_rejects_slash_in_name() {
        let config = config_with(vec![GatewayConfig::new("a/b", "http://127.0.0.1:9000")]);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "gateways[0].name");
    }

    #[test]
    fn test_unix_socket_skips_bind_address() {
        let mut config = config_with(vec![]);
        config.listener.bind_address = "not an address".into();
        assert!(validate_config(&config).is_err());

        config.listener.unix_socket = Some("/tmp/relay.sock".into());
        assert!(validate_config(&config).is_ok());
    }
}

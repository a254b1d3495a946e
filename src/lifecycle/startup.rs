//! Startup orchestration.
//!
//! # Responsibilities
//! - Build subsystems from validated configuration in dependency order
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::RelayConfig;
use crate::forwarding::ForwardingEngine;
use crate::gateway::tls::TlsError;
use crate::gateway::GatewayClient;
use crate::http::HttpServer;
use crate::net::{ListenerError, RelayListener};
use crate::routing::GatewayRegistry;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("gateway TLS setup failed: {0}")]
    Tls(#[from] TlsError),

    #[error("listener setup failed: {0}")]
    Listener(#[from] ListenerError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// A fully wired relay, ready to serve.
pub struct Relay {
    config: RelayConfig,
    gateway: Arc<GatewayClient>,
    server: HttpServer,
}

impl Relay {
    /// Wire registry, gateway client, engine and HTTP front.
    pub fn build(config: RelayConfig) -> Result<Self, StartupError> {
        let registry = Arc::new(GatewayRegistry::from_config(&config));
        if registry.is_empty() {
            tracing::warn!("No gateways configured; every relay request will be rejected");
        }

        let gateway = Arc::new(GatewayClient::new(&registry, &config)?);
        let engine = Arc::new(ForwardingEngine::new(
            registry.clone(),
            gateway.clone(),
            config.limits.max_response_size,
        ));
        let server = HttpServer::new(&config, engine);

        for target in registry.targets() {
            tracing::info!(
                gateway = %target.name,
                pool_size = target.pool_size,
                request_timeout_ms = target.request_timeout.as_millis() as u64,
                "Gateway registered"
            );
        }

        Ok(Self {
            config,
            gateway,
            server,
        })
    }

    pub fn gateway(&self) -> &Arc<GatewayClient> {
        &self.gateway
    }

    /// Bind the configured listener.
    pub async fn bind(&self) -> Result<RelayListener, StartupError> {
        Ok(RelayListener::bind(&self.config.listener).await?)
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn serve(self, listener: RelayListener, shutdown: broadcast::Receiver<()>) -> Result<(), StartupError> {
        self.server.run(listener, shutdown).await?;
        Ok(())
    }
}

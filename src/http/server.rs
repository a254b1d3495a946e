//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay route and liveness route
//! - Wire up middleware (concurrency limit, timeout, trace)
//! - Serve on a TCP or Unix listener with graceful shutdown
//! - Hand validated requests to the forwarding engine
//! - Record aggregate exchange metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RelayConfig;
use crate::forwarding::ForwardingEngine;
use crate::gateway::GatewayTransport;
use crate::http::request::{parse_inbound, RouteSettings};
use crate::http::response;
use crate::net::RelayListener;
use crate::observability::metrics;

/// Application state injected into handlers.
pub struct AppState<G> {
    pub engine: Arc<ForwardingEngine<G>>,
    pub route: Arc<RouteSettings>,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            route: self.route.clone(),
        }
    }
}

/// HTTP front for the relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a forwarding engine.
    pub fn new<G: GatewayTransport>(config: &RelayConfig, engine: Arc<ForwardingEngine<G>>) -> Self {
        // Validation guarantees a valid header name; the fallback is the default.
        let selector_header = HeaderName::from_bytes(config.routing.selector_header.as_bytes())
            .unwrap_or_else(|_| HeaderName::from_static("ohttp-gateway"));

        let inbound_timeout = Self::inbound_timeout(config, &engine);

        let state = AppState {
            engine,
            route: Arc::new(RouteSettings {
                path_prefix: config.routing.path_prefix.clone(),
                selector_header,
                max_body_size: config.limits.max_body_size,
            }),
        };

        let router = Self::build_router(config, state, inbound_timeout);
        Self { router }
    }

    /// Longest time any exchange may legitimately take: body upload plus
    /// the slowest target's queue wait and exchange deadline.
    fn inbound_timeout<G: GatewayTransport>(config: &RelayConfig, engine: &ForwardingEngine<G>) -> Duration {
        let slowest = engine
            .registry()
            .targets()
            .map(|t| t.queue_wait + t.request_timeout)
            .max()
            .unwrap_or_default();
        slowest + Duration::from_millis(config.timeouts.request_ms)
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<G: GatewayTransport>(config: &RelayConfig, state: AppState<G>, timeout: Duration) -> Router {
        let prefix = config.routing.path_prefix.clone();
        let with_target = if prefix == "/" {
            "/{target}".to_string()
        } else {
            format!("{}/{{target}}", prefix)
        };

        Router::new()
            .route("/health", get(health_handler::<G>))
            .route(&prefix, any(relay_handler::<G>))
            .route(&with_target, any(relay_handler::<G>))
            .with_state(state)
            .layer(TimeoutLayer::new(timeout))
            // Router::layer wraps each route separately; the global layer
            // keeps a single semaphore across all of them.
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_inflight))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(self, listener: RelayListener, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        tracing::info!(address = %listener.describe(), "HTTP server starting");

        let signal = async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
        };

        match listener {
            RelayListener::Tcp(tcp) => axum::serve(tcp, self.router).with_graceful_shutdown(signal).await?,
            RelayListener::Unix(unix) => axum::serve(unix, self.router).with_graceful_shutdown(signal).await?,
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Relay handler: validate, forward, respond.
///
/// Nothing about the client or the message is logged here.
async fn relay_handler<G: GatewayTransport>(State(state): State<AppState<G>>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();

    let result = match parse_inbound(&state.route, &parts, body).await {
        Ok(inbound) => state.engine.forward(&inbound.selector, inbound.message).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(message) => {
            metrics::record_exchange("ok", start);
            response::encapsulated(&message)
        }
        Err(e) => {
            metrics::record_exchange(e.outcome(), start);
            e.into_response()
        }
    }
}

/// Liveness probe for the front-door proxy.
async fn health_handler<G: GatewayTransport>(State(state): State<AppState<G>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "gateways": state.engine.registry().len(),
    }))
}

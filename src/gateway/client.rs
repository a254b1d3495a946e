//! Production gateway client.
//!
//! # Responsibilities
//! - One bounded [`ConnectionPool`] per configured gateway
//! - Lease: queue for a slot, reuse an idle connection or dial a new one
//! - Send: one HTTP/1.1 POST per lease under the exchange deadline
//! - Release: return clean connections, close everything else

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use axum::http::{Method, Request};

use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::gateway::connector::{Connector, GatewayConnection};
use crate::gateway::lease::ConnectionLease;
use crate::gateway::pool::{ConnectionPool, PoolStats};
use crate::gateway::tls::{create_tls_connector, TlsError};
use crate::gateway::{GatewayResponse, GatewayTransport, OutboundRequest};
use crate::observability::metrics;
use crate::resilience::retries::ConnectRetryPolicy;
use crate::resilience::timeouts::{Deadline, Expired};
use crate::routing::{GatewayRegistry, GatewayTarget};

/// Connection-managing client for all configured gateways.
pub struct GatewayClient {
    pools: HashMap<String, Arc<ConnectionPool>>,
    connector: Connector,
    retry: ConnectRetryPolicy,
    connect_timeout: Duration,
    max_response_size: usize,
}

impl GatewayClient {
    /// Build pools for every registered gateway.
    ///
    /// TLS roots are loaded only when at least one gateway uses https.
    pub fn new(registry: &GatewayRegistry, config: &RelayConfig) -> Result<Self, TlsError> {
        let needs_tls = registry.targets().any(|t| t.endpoint.scheme() == "https");
        let connector = if needs_tls {
            Connector::with_tls(create_tls_connector()?)
        } else {
            Connector::plain()
        };
        Ok(Self::with_connector(registry, config, connector))
    }

    pub fn with_connector(registry: &GatewayRegistry, config: &RelayConfig, connector: Connector) -> Self {
        let pools = registry
            .targets()
            .map(|target| {
                let pool = ConnectionPool::new(target.clone(), config.timeouts.idle());
                (target.name.clone(), Arc::new(pool))
            })
            .collect();

        Self {
            pools,
            connector,
            retry: ConnectRetryPolicy::new(&config.retries),
            connect_timeout: config.timeouts.connect(),
            max_response_size: config.limits.max_response_size,
        }
    }

    pub fn pool_stats(&self, gateway: &str) -> Option<PoolStats> {
        self.pools.get(gateway).map(|p| p.stats())
    }

    /// Dial a connection, retrying connect-phase failures within the deadline.
    async fn connect_with_retry(
        &self,
        pool: &ConnectionPool,
        deadline: &Deadline,
    ) -> RelayResult<GatewayConnection> {
        let target = pool.target();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let failure = match deadline
                .run_capped(self.connect_timeout, self.connector.connect(target, pool.open_counter()))
                .await
            {
                Ok(Ok(conn)) => {
                    pool.record_created();
                    metrics::connect_attempt(&target.name, "ok");
                    return Ok(conn);
                }
                Ok(Err(e)) => e.to_string(),
                Err(Expired::Deadline) => {
                    metrics::connect_attempt(&target.name, "timeout");
                    return Err(RelayError::GatewayTimeout);
                }
                Err(Expired::Limit) => "connect timed out".to_string(),
            };

            metrics::connect_attempt(&target.name, "error");

            match self.retry.next_delay(attempt) {
                Some(delay) => {
                    tracing::debug!(gateway = %target.name, attempt, error = %failure, "Retrying gateway connect");
                    if deadline.run(tokio::time::sleep(delay)).await.is_err() {
                        return Err(RelayError::GatewayTimeout);
                    }
                }
                None => {
                    tracing::warn!(gateway = %target.name, attempts = attempt, error = %failure, "Gateway unreachable");
                    return Err(RelayError::GatewayUnreachable(failure));
                }
            }
        }
    }

    /// Make sure the lease holds a connection ready to take a request.
    ///
    /// A pooled connection the gateway closed while idle is replaced with a
    /// fresh one; nothing has been sent on it, so this is still connect phase.
    async fn ensure_ready(&self, lease: &mut ConnectionLease) -> RelayResult<()> {
        let deadline = lease.deadline();

        let ready = match lease.connection_mut() {
            Some(conn) => deadline.run(conn.sender_mut().ready()).await,
            None => return Err(RelayError::GatewayUnreachable("lease discarded".into())),
        };

        match ready {
            Ok(Ok(())) => Ok(()),
            Err(_) => {
                lease.discard();
                Err(RelayError::GatewayTimeout)
            }
            Ok(Err(e)) if lease.was_reused() => {
                tracing::debug!(error = %e, "Pooled gateway connection went stale");
                self.redial(lease, &deadline).await
            }
            Ok(Err(e)) => {
                lease.discard();
                Err(RelayError::GatewayUnreachable(e.to_string()))
            }
        }
    }

    /// Close the lease's connection and dial a replacement under the same deadline.
    async fn redial(&self, lease: &mut ConnectionLease, deadline: &Deadline) -> RelayResult<()> {
        lease.discard();
        let pool = lease.pool().clone();
        let conn = self.connect_with_retry(&pool, deadline).await?;
        lease.replace(conn);
        Ok(())
    }
}

fn build_request(target: &GatewayTarget, request: OutboundRequest) -> RelayResult<Request<Body>> {
    Request::builder()
        .method(Method::POST)
        .uri(target.request_path())
        .header(HOST, target.host_header())
        .header(CONTENT_TYPE, request.media_type.as_str())
        .header(CONTENT_LENGTH, request.body.len())
        .body(Body::from(request.body))
        .map_err(|e| RelayError::GatewayError(format!("invalid outbound request: {}", e)))
}

impl GatewayTransport for GatewayClient {
    type Lease = ConnectionLease;

    async fn lease(&self, target: &Arc<GatewayTarget>) -> RelayResult<ConnectionLease> {
        let pool = self
            .pools
            .get(&target.name)
            .cloned()
            .ok_or(RelayError::UnknownGateway)?;

        let slot = match pool.acquire_slot().await {
            Some(slot) => slot,
            None => {
                tracing::debug!(gateway = %target.name, "Gateway pool exhausted");
                return Err(RelayError::GatewayBusy);
            }
        };

        let deadline = Deadline::after(target.request_timeout);
        let (conn, reused) = match pool.take_idle() {
            Some(conn) => (conn, true),
            None => (self.connect_with_retry(&pool, &deadline).await?, false),
        };

        Ok(ConnectionLease::new(pool, slot, conn, deadline, reused))
    }

    async fn send(&self, lease: &mut ConnectionLease, request: OutboundRequest) -> RelayResult<GatewayResponse> {
        self.ensure_ready(lease).await?;

        let deadline = lease.deadline();
        let mut request = build_request(lease.target(), request)?;
        let mut redialled = false;

        let response = loop {
            let conn = lease
                .connection_mut()
                .ok_or_else(|| RelayError::GatewayUnreachable("lease discarded".into()))?;

            let attempt = deadline.run(conn.sender_mut().try_send_request(request)).await;
            match attempt {
                Ok(Ok(response)) => break response,
                Ok(Err(mut failed)) => match failed.take_message() {
                    // Never written: the gateway closed the idle connection
                    // first. Dialling again is still connect phase.
                    Some(unsent) if !redialled => {
                        tracing::debug!(error = %failed.error(), "Gateway closed pooled connection before send");
                        self.redial(lease, &deadline).await?;
                        request = unsent;
                        redialled = true;
                    }
                    _ => {
                        lease.discard();
                        return Err(RelayError::GatewayUnreachable(failed.into_error().to_string()));
                    }
                },
                Err(_) => {
                    lease.discard();
                    return Err(RelayError::GatewayTimeout);
                }
            }
        };

        let (parts, incoming) = response.into_parts();
        let body = match deadline
            .run(axum::body::to_bytes(Body::new(incoming), self.max_response_size))
            .await
        {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                lease.discard();
                return Err(RelayError::GatewayError(e.to_string()));
            }
            Err(_) => {
                lease.discard();
                return Err(RelayError::GatewayTimeout);
            }
        };

        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        lease.mark_reusable();
        Ok(GatewayResponse {
            status: parts.status,
            content_type,
            body,
        })
    }

    fn release(&self, lease: ConnectionLease) {
        lease.release();
    }
}

//! Per-gateway connection pool.
//!
//! # Responsibilities
//! - Bound the number of simultaneously open connections per gateway
//! - Keep idle connections for reuse, expiring stale ones
//! - Queue lease requests until a slot frees or the queue wait elapses
//!
//! # Invariant
//! Every leased connection holds one semaphore permit and idle connections
//! are only handed out under a permit, so `leased + idle <= pool_size`
//! at all times.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::gateway::connector::{GatewayConnection, OpenConnections};
use crate::routing::GatewayTarget;

/// Snapshot of a pool's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections currently open (idle + leased).
    pub open: usize,
    /// Connections waiting in the idle list.
    pub idle: usize,
    /// Leases currently checked out.
    pub leased: usize,
    /// Connections dialled since startup.
    pub created_total: u64,
}

/// Bounded pool of connections to one gateway.
#[derive(Debug)]
pub struct ConnectionPool {
    target: Arc<GatewayTarget>,
    slots: Arc<Semaphore>,
    idle: Mutex<Vec<GatewayConnection>>,
    open: Arc<OpenConnections>,
    created_total: AtomicU64,
    idle_timeout: Duration,
}

impl ConnectionPool {
    pub fn new(target: Arc<GatewayTarget>, idle_timeout: Duration) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(target.pool_size)),
            idle: Mutex::new(Vec::with_capacity(target.pool_size)),
            open: Arc::new(OpenConnections::new(target.name.clone())),
            created_total: AtomicU64::new(0),
            idle_timeout,
            target,
        }
    }

    pub fn target(&self) -> &Arc<GatewayTarget> {
        &self.target
    }

    pub(crate) fn open_counter(&self) -> &Arc<OpenConnections> {
        &self.open
    }

    /// Wait for a free slot, up to the target's queue wait.
    ///
    /// Returns `None` if the wait elapsed.
    pub async fn acquire_slot(&self) -> Option<OwnedSemaphorePermit> {
        match tokio::time::timeout(self.target.queue_wait, self.slots.clone().acquire_owned()).await {
            Ok(Ok(permit)) => Some(permit),
            Ok(Err(_)) | Err(_) => None,
        }
    }

    /// Take the most recently used idle connection that is still usable.
    ///
    /// Closed or expired connections found on the way are dropped.
    pub fn take_idle(&self) -> Option<GatewayConnection> {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(conn) = idle.pop() {
            if conn.is_closed() || conn.idle_since().elapsed() >= self.idle_timeout {
                continue;
            }
            return Some(conn);
        }
        None
    }

    /// Return a connection to the idle list.
    pub fn put_idle(&self, mut conn: GatewayConnection) {
        if conn.is_closed() {
            return;
        }
        conn.mark_idle();
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        idle.push(conn);
    }

    pub(crate) fn record_created(&self) {
        self.created_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> PoolStats {
        let idle = self.idle.lock().unwrap_or_else(|e| e.into_inner()).len();
        PoolStats {
            open: self.open.get(),
            idle,
            leased: self.target.pool_size - self.slots.available_permits(),
            created_total: self.created_total.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GatewayConfig, RelayConfig};

    fn pool(pool_size: usize, queue_wait_ms: u64) -> ConnectionPool {
        let mut gateway = GatewayConfig::new("g1", "http://127.0.0.1:1");
        gateway.pool_size = pool_size;
        gateway.queue_wait_ms = Some(queue_wait_ms);
        let target = GatewayTarget::from_config(&gateway, &RelayConfig::default()).unwrap();
        ConnectionPool::new(Arc::new(target), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_slots_bounded() {
        let pool = pool(2, 50);
        let a = pool.acquire_slot().await.unwrap();
        let _b = pool.acquire_slot().await.unwrap();
        assert_eq!(pool.stats().leased, 2);

        assert!(pool.acquire_slot().await.is_none());

        drop(a);
        assert!(pool.acquire_slot().await.is_some());
    }

    #[tokio::test]
    async fn test_waiter_gets_freed_slot() {
        let pool = Arc::new(pool(1, 1_000));
        let held = pool.acquire_slot().await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire_slot().await.is_some() })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(held);
        assert!(waiter.await.unwrap());
    }

    #[test]
    fn test_empty_idle_list() {
        let pool = pool(1, 50);
        assert!(pool.take_idle().is_none());
        assert_eq!(
            pool.stats(),
            PoolStats {
                open: 0,
                idle: 0,
                leased: 0,
                created_total: 0
            }
        );
    }
}

//! Connection leases.

use std::sync::Arc;

use tokio::sync::OwnedSemaphorePermit;

use crate::gateway::connector::GatewayConnection;
use crate::gateway::pool::ConnectionPool;
use crate::resilience::timeouts::Deadline;
use crate::routing::GatewayTarget;

/// A checked-out connection to one gateway, held by a single exchange.
///
/// The lease owns a pool slot for its whole life. A connection goes back to
/// the pool only through [`ConnectionLease::release`] after a clean
/// exchange; any other way of ending the lease (error, timeout, the exchange
/// future being dropped) closes the connection.
#[derive(Debug)]
pub struct ConnectionLease {
    // Field order matters: the connection is dropped before the slot frees.
    conn: Option<GatewayConnection>,
    pool: Arc<ConnectionPool>,
    _slot: OwnedSemaphorePermit,
    deadline: Deadline,
    reused: bool,
    reusable: bool,
}

impl ConnectionLease {
    pub(crate) fn new(
        pool: Arc<ConnectionPool>,
        slot: OwnedSemaphorePermit,
        conn: GatewayConnection,
        deadline: Deadline,
        reused: bool,
    ) -> Self {
        Self {
            conn: Some(conn),
            pool,
            _slot: slot,
            deadline,
            reused,
            reusable: false,
        }
    }

    pub fn target(&self) -> &Arc<GatewayTarget> {
        self.pool.target()
    }

    pub(crate) fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Deadline of the exchange this lease serves.
    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// True if the connection came from the idle list.
    pub fn was_reused(&self) -> bool {
        self.reused
    }

    pub(crate) fn connection_mut(&mut self) -> Option<&mut GatewayConnection> {
        self.conn.as_mut()
    }

    /// Swap in a freshly dialled connection.
    pub(crate) fn replace(&mut self, conn: GatewayConnection) {
        self.conn = Some(conn);
        self.reused = false;
        self.reusable = false;
    }

    /// Allow the connection back into the pool on release.
    pub(crate) fn mark_reusable(&mut self) {
        self.reusable = true;
    }

    /// Close the connection now. The slot is still held until drop.
    pub(crate) fn discard(&mut self) {
        self.conn = None;
        self.reusable = false;
    }

    /// End the lease, returning the connection to the pool if it is clean.
    pub fn release(mut self) {
        if let Some(conn) = self.conn.take() {
            if self.reusable {
                self.pool.put_idle(conn);
            }
        }
    }
}

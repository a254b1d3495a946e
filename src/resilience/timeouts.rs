//! Timeout enforcement.
//!
//! # Responsibilities
//! - Carry one exchange deadline across connect, send and receive
//! - Cancel the wrapped future cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out exchanges return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// The deadline elapsed before the operation completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed;

impl std::fmt::Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deadline elapsed")
    }
}

impl std::error::Error for Elapsed {}

/// Which bound stopped a capped operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expired {
    /// The exchange deadline passed; the exchange is over.
    Deadline,
    /// Only the per-operation cap passed; the deadline still has time.
    Limit,
}

/// A fixed point in time by which an exchange must finish.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(duration: Duration) -> Self {
        Self {
            at: Instant::now() + duration,
        }
    }

    /// Run `fut`, failing with [`Elapsed`] once the deadline passes.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Elapsed> {
        tokio::time::timeout_at(self.at, fut).await.map_err(|_| Elapsed)
    }

    /// Run `fut` bounded by the earlier of this deadline and `limit`,
    /// reporting which of the two ran out.
    pub async fn run_capped<F: Future>(&self, limit: Duration, fut: F) -> Result<F::Output, Expired> {
        let capped = Instant::now() + limit;
        if capped < self.at {
            tokio::time::timeout_at(capped, fut).await.map_err(|_| Expired::Limit)
        } else {
            tokio::time::timeout_at(self.at, fut).await.map_err(|_| Expired::Deadline)
        }
    }
}

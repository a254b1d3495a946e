//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Lease for a gateway:
//!     → timeouts.rs (exchange deadline armed)
//!     → connect attempt fails: retries.rs (connect phase only, backoff.rs delay)
//!     → send + receive bounded by the remaining deadline
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every gateway call has a deadline
//! - Only connection establishment is retried, never a send
//! - Jittered backoff prevents thundering herd on a restarting gateway

pub mod backoff;
pub mod retries;
pub mod timeouts;

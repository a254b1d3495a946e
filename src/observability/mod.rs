//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured operational log events)
//!     → metrics.rs (aggregate counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Signals are aggregate only: no request IDs, peer addresses, or payloads
//! - Labels are bounded (outcome, gateway name), never per-request values
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

//! Gateway routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (path, selector header)
//!     → selector.rs (extract target selector)
//!     → router.rs (allow-list lookup)
//!     → Return: Arc<GatewayTarget> or UnknownGateway
//!
//! Registry compilation (at startup):
//!     GatewayConfig[] + global limits/timeouts
//!     → target.rs (resolve per-target policy)
//!     → Freeze as immutable GatewayRegistry
//! ```
//!
//! # Design Decisions
//! - Targets compiled at startup, immutable at runtime
//! - Exact name lookup only; no prefix or pattern matching
//! - Explicit UnknownGateway rather than silent default

pub mod router;
pub mod selector;
pub mod target;

pub use router::GatewayRegistry;
pub use selector::TargetSelector;
pub use target::GatewayTarget;

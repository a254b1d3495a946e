//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Front-door proxy (TLS terminated upstream)
//!     → listener.rs (bind TCP address or Unix socket)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Plain HTTP only; TLS belongs to the front-door proxy
//! - Peer addresses are never read or recorded

pub mod listener;

pub use listener::{ListenerError, RelayListener};

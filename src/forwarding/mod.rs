//! Forwarding engine subsystem.
//!
//! # Data Flow
//! ```text
//! (TargetSelector, EncapsulatedMessage) from the HTTP front
//!     → engine.rs prepare: allow-list lookup + target policy
//!     → exchange.rs ForwardingRequest (one message bound to one target)
//!     → engine.rs execute: lease → send → release
//!     → response interpretation → EncapsulatedMessage (response variant)
//! ```
//!
//! # Design Decisions
//! - Nothing leaves the process before the target and policy checks pass
//! - A message is sent at most once; failures are terminal for the exchange
//! - No per-exchange logging of payloads, peers, or identifiers

pub mod engine;
pub mod exchange;

pub use engine::ForwardingEngine;
pub use exchange::ForwardingRequest;

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Plain HTTP from the front-door proxy
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (method, media type, bounded body, target selector)
//!     → framing decode → forwarding engine
//!     → response.rs (encapsulated response or status mapping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};

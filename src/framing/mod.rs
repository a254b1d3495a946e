//! OHTTP message framing.
//!
//! # Data Flow
//! ```text
//! inbound body + Content-Type
//!     → media_type.rs (recognize message/ohttp-req | message/ohttp-res)
//!     → codec.rs (bound check, wrap as EncapsulatedMessage)
//!     → forwarding engine
//!
//! gateway body + Content-Type
//!     → codec.rs (decode as response variant)
//!     → codec.rs encode → client response body
//! ```
//!
//! # Design Decisions
//! - Payload bytes are never inspected; only framing metadata is validated
//! - Encoding is the identity on the payload, so decode → encode is lossless

pub mod codec;
pub mod media_type;

pub use codec::{decode, encode, EncapsulatedMessage};
pub use media_type::MediaType;

//! Encapsulated message codec.
//!
//! The relay only checks the envelope: a recognized media type and a
//! payload length within bounds. The payload itself stays opaque.

use axum::body::Bytes;

use crate::error::{FramingFault, RelayError, RelayResult};
use crate::framing::MediaType;

/// An opaque OHTTP payload tagged with its message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncapsulatedMessage {
    media_type: MediaType,
    payload: Bytes,
}

impl EncapsulatedMessage {
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Decode a body into an [`EncapsulatedMessage`].
///
/// Fails with `MalformedMessage` if the declared media type is not an OHTTP
/// message type, the body is empty, or the body is longer than `max_len`.
pub fn decode(bytes: Bytes, declared_media_type: &str, max_len: usize) -> RelayResult<EncapsulatedMessage> {
    let media_type = MediaType::parse(declared_media_type)
        .ok_or(RelayError::MalformedMessage(FramingFault::MediaType))?;

    if bytes.is_empty() {
        return Err(RelayError::MalformedMessage(FramingFault::Empty));
    }
    if bytes.len() > max_len {
        return Err(RelayError::MalformedMessage(FramingFault::TooLarge));
    }

    Ok(EncapsulatedMessage {
        media_type,
        payload: bytes,
    })
}

/// Encode a message back to wire bytes. The payload is returned as is.
pub fn encode(message: &EncapsulatedMessage) -> Bytes {
    message.payload.clone()
}

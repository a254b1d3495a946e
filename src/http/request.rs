//! Inbound request validation.
//!
//! # Responsibilities
//! - Accept only POST on the relay route
//! - Require the OHTTP request media type
//! - Read the body within the global size bound
//! - Extract the target selector
//!
//! # Design Decisions
//! - Declared Content-Length is checked before the body is read
//! - Only Content-Type, Content-Length and the selector header are read;
//!   no other client header is ever consulted or forwarded

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, Method};

use crate::error::{FramingFault, RelayError, RelayResult};
use crate::framing::{self, EncapsulatedMessage, MediaType};
use crate::routing::TargetSelector;

/// Static route settings used to parse inbound requests.
#[derive(Debug, Clone)]
pub struct RouteSettings {
    pub path_prefix: String,
    pub selector_header: HeaderName,
    pub max_body_size: usize,
}

/// A validated inbound relay request.
#[derive(Debug)]
pub struct InboundRequest {
    pub selector: TargetSelector,
    pub message: EncapsulatedMessage,
}

/// Check method and headers, then read and decode the body.
pub async fn parse_inbound(settings: &RouteSettings, parts: &Parts, body: Body) -> RelayResult<InboundRequest> {
    if parts.method != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }

    let selector = TargetSelector::from_request(
        &settings.path_prefix,
        parts.uri.path(),
        &parts.headers,
        &settings.selector_header,
    )
    .ok_or(RelayError::UnknownGateway)?;

    let content_type = request_media_type(&parts.headers)?;

    if declared_length(&parts.headers).is_some_and(|len| len > settings.max_body_size) {
        return Err(RelayError::MalformedMessage(FramingFault::TooLarge));
    }

    // Past the length check, a read failure means the body overran the bound
    // (chunked upload) or the client went away; either way nothing is forwarded.
    let bytes: Bytes = axum::body::to_bytes(body, settings.max_body_size)
        .await
        .map_err(|_| RelayError::MalformedMessage(FramingFault::TooLarge))?;

    let message = framing::decode(bytes, content_type, settings.max_body_size)?;
    Ok(InboundRequest { selector, message })
}

/// The declared Content-Type, if it is exactly the OHTTP request type.
fn request_media_type(headers: &HeaderMap) -> RelayResult<&str> {
    let value = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or(RelayError::UnsupportedMediaType)?;

    match MediaType::parse(value) {
        Some(MediaType::Request) => Ok(value),
        _ => Err(RelayError::UnsupportedMediaType),
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

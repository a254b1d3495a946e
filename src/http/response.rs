//! Response construction.
//!
//! # Responsibilities
//! - Write an encapsulated response with the OHTTP response media type
//! - Map relay errors to HTTP status codes
//!
//! # Design Decisions
//! - Error bodies carry only the canonical reason phrase; gateway names and
//!   upstream detail never reach the client
//! - Gateway timeouts result in 504, other gateway failures in 502/503

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::{FramingFault, RelayError};
use crate::framing::{self, EncapsulatedMessage};

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MalformedMessage(FramingFault::TooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::MalformedMessage(_) => StatusCode::BAD_REQUEST,
            RelayError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::UnknownGateway => StatusCode::NOT_FOUND,
            RelayError::PolicyViolation => StatusCode::BAD_REQUEST,
            RelayError::GatewayBusy => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            RelayError::GatewayUnreachable(_) => StatusCode::BAD_GATEWAY,
            RelayError::GatewayError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}

/// 200 response carrying the encapsulated response bytes.
pub fn encapsulated(message: &EncapsulatedMessage) -> Response {
    let mut response = Response::new(Body::from(framing::encode(message)));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(message.media_type().as_str()),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RelayError::UnknownGateway.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(RelayError::GatewayBusy.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(RelayError::GatewayTimeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            RelayError::MalformedMessage(FramingFault::Empty).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::MalformedMessage(FramingFault::TooLarge).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn test_error_body_hides_detail() {
        let response = RelayError::GatewayError("g1 said: bad key id".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body, Bytes::from_static(b"Bad Gateway"));
    }

    #[tokio::test]
    async fn test_encapsulated_response() {
        let message = framing::decode(Bytes::from_static(b"\x00\x01\x02"), "message/ohttp-res", 16).unwrap();
        let response = encapsulated(&message);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "message/ohttp-res");
        let body = axum::body::to_bytes(response.into_body(), 16).await.unwrap();
        assert_eq!(body, Bytes::from_static(b"\x00\x01\x02"));
    }
}

//! Relay error taxonomy.
//!
//! Every failure is terminal for the exchange it belongs to. The variants
//! carry only what is needed to pick a status code and an outcome label;
//! none of them carry payload bytes or client identity.

use thiserror::Error;

/// Why an encapsulated message was rejected at the framing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingFault {
    /// Declared media type is not one of the OHTTP message types.
    MediaType,
    /// Payload is empty.
    Empty,
    /// Payload exceeds the configured bound.
    TooLarge,
}

impl std::fmt::Display for FramingFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FramingFault::MediaType => write!(f, "unrecognized media type"),
            FramingFault::Empty => write!(f, "empty payload"),
            FramingFault::TooLarge => write!(f, "payload too large"),
        }
    }
}

/// Errors surfaced by one relay exchange.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("malformed message: {0}")]
    MalformedMessage(FramingFault),

    #[error("unsupported media type")]
    UnsupportedMediaType,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("unknown gateway")]
    UnknownGateway,

    #[error("policy violation")]
    PolicyViolation,

    /// Pool for the target stayed exhausted for the whole queue wait.
    #[error("gateway busy")]
    GatewayBusy,

    #[error("gateway timeout")]
    GatewayTimeout,

    #[error("gateway unreachable: {0}")]
    GatewayUnreachable(String),

    /// The Gateway answered, but not with an encapsulated response.
    #[error("gateway error: {0}")]
    GatewayError(String),
}

impl RelayError {
    /// Stable label used for aggregate metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::MalformedMessage(FramingFault::TooLarge) => "too_large",
            RelayError::MalformedMessage(_) => "malformed",
            RelayError::UnsupportedMediaType => "unsupported_media_type",
            RelayError::MethodNotAllowed => "method_not_allowed",
            RelayError::UnknownGateway => "unknown_gateway",
            RelayError::PolicyViolation => "policy_violation",
            RelayError::GatewayBusy => "gateway_busy",
            RelayError::GatewayTimeout => "gateway_timeout",
            RelayError::GatewayUnreachable(_) => "gateway_unreachable",
            RelayError::GatewayError(_) => "gateway_error",
        }
    }
}

pub type RelayResult<T> = Result<T, RelayError>;

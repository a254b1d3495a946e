//! Exchange orchestration.

use std::sync::Arc;

use crate::error::{RelayError, RelayResult};
use crate::forwarding::exchange::ForwardingRequest;
use crate::framing::{self, EncapsulatedMessage, MediaType};
use crate::gateway::{GatewayResponse, GatewayTransport, OutboundRequest};
use crate::routing::{GatewayRegistry, TargetSelector};

/// Drives one exchange from selector to encapsulated response.
pub struct ForwardingEngine<G> {
    registry: Arc<GatewayRegistry>,
    gateway: Arc<G>,
    max_response_size: usize,
}

impl<G> Clone for ForwardingEngine<G> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            gateway: self.gateway.clone(),
            max_response_size: self.max_response_size,
        }
    }
}

impl<G: GatewayTransport> ForwardingEngine<G> {
    pub fn new(registry: Arc<GatewayRegistry>, gateway: Arc<G>, max_response_size: usize) -> Self {
        Self {
            registry,
            gateway,
            max_response_size,
        }
    }

    pub fn registry(&self) -> &Arc<GatewayRegistry> {
        &self.registry
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Resolve the target and check the message against its policy.
    pub fn prepare(&self, selector: &TargetSelector, message: EncapsulatedMessage) -> RelayResult<ForwardingRequest> {
        let target = self.registry.resolve(selector)?;
        target.check(&message)?;
        Ok(ForwardingRequest::new(target, message))
    }

    /// Forward a prepared request and return the gateway's encapsulated response.
    pub async fn execute(&self, request: ForwardingRequest) -> RelayResult<EncapsulatedMessage> {
        let (target, message) = request.into_parts();

        let mut lease = self.gateway.lease(&target).await?;

        let outbound = OutboundRequest {
            media_type: message.media_type(),
            body: framing::encode(&message),
        };
        let sent = self.gateway.send(&mut lease, outbound).await;
        self.gateway.release(lease);

        interpret_response(sent?, self.max_response_size)
    }

    /// Prepare and execute in one step.
    pub async fn forward(&self, selector: &TargetSelector, message: EncapsulatedMessage) -> RelayResult<EncapsulatedMessage> {
        let request = self.prepare(selector, message)?;
        self.execute(request).await
    }
}

/// Accept only a successful response carrying an encapsulated response.
///
/// Anything else (error status, plain error body, empty or oversized body)
/// is a gateway error and is never decoded as an OHTTP message.
fn interpret_response(response: GatewayResponse, max_len: usize) -> RelayResult<EncapsulatedMessage> {
    if !response.status.is_success() {
        return Err(RelayError::GatewayError(format!("status {}", response.status.as_u16())));
    }

    let content_type = response.content_type.as_deref().unwrap_or_default();
    if MediaType::parse(content_type) != Some(MediaType::Response) {
        return Err(RelayError::GatewayError("unexpected media type".into()));
    }

    framing::decode(response.body, content_type, max_len)
        .map_err(|e| RelayError::GatewayError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Bytes;
    use axum::http::StatusCode;

    use crate::config::{GatewayConfig, RelayConfig};
    use crate::error::FramingFault;
    use crate::routing::GatewayTarget;

    /// Transport that records calls and answers with a canned result.
    struct MockTransport {
        leases: AtomicUsize,
        sends: AtomicUsize,
        releases: AtomicUsize,
        reply: fn() -> RelayResult<GatewayResponse>,
    }

    impl MockTransport {
        fn new(reply: fn() -> RelayResult<GatewayResponse>) -> Self {
            Self {
                leases: AtomicUsize::new(0),
                sends: AtomicUsize::new(0),
                releases: AtomicUsize::new(0),
                reply,
            }
        }
    }

    impl GatewayTransport for MockTransport {
        type Lease = Vec<Bytes>;

        async fn lease(&self, _target: &Arc<GatewayTarget>) -> RelayResult<Vec<Bytes>> {
            self.leases.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn send(&self, lease: &mut Vec<Bytes>, request: OutboundRequest) -> RelayResult<GatewayResponse> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.media_type, MediaType::Request);
            lease.push(request.body);
            (self.reply)()
        }

        fn release(&self, _lease: Vec<Bytes>) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ok_reply() -> RelayResult<GatewayResponse> {
        Ok(GatewayResponse {
            status: StatusCode::OK,
            content_type: Some("message/ohttp-res".into()),
            body: Bytes::from(vec![9u8; 256]),
        })
    }

    fn engine(reply: fn() -> RelayResult<GatewayResponse>) -> ForwardingEngine<MockTransport> {
        let mut config = RelayConfig::default();
        config.gateways.push(GatewayConfig::new("g1", "http://127.0.0.1:9001"));
        let mut small = GatewayConfig::new("small", "http://127.0.0.1:9002");
        small.max_body_size = Some(8);
        config.gateways.push(small);
        let mut responses_only = GatewayConfig::new("odd", "http://127.0.0.1:9003");
        responses_only.accepted_media_types = vec![MediaType::Response];
        config.gateways.push(responses_only);

        let registry = Arc::new(GatewayRegistry::from_config(&config));
        ForwardingEngine::new(registry, Arc::new(MockTransport::new(reply)), 4096)
    }

    fn request_message(len: usize) -> EncapsulatedMessage {
        framing::decode(Bytes::from(vec![1u8; len]), "message/ohttp-req", 1 << 20).unwrap()
    }

    fn named(name: &str) -> TargetSelector {
        TargetSelector::Named(name.into())
    }

    #[tokio::test]
    async fn test_forward_success() {
        let engine = engine(ok_reply);
        let response = engine.forward(&named("g1"), request_message(512)).await.unwrap();

        assert_eq!(response.media_type(), MediaType::Response);
        assert_eq!(response.payload(), &Bytes::from(vec![9u8; 256]));

        let mock = engine.gateway();
        assert_eq!(mock.leases.load(Ordering::SeqCst), 1);
        assert_eq!(mock.sends.load(Ordering::SeqCst), 1);
        assert_eq!(mock.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_gateway_makes_no_outbound_call() {
        let engine = engine(ok_reply);
        let err = engine.forward(&named("unknown"), request_message(16)).await.unwrap_err();

        assert!(matches!(err, RelayError::UnknownGateway));
        assert_eq!(engine.gateway().leases.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_policy_checks_before_lease() {
        let engine = engine(ok_reply);

        let err = engine.forward(&named("small"), request_message(9)).await.unwrap_err();
        assert!(matches!(err, RelayError::MalformedMessage(FramingFault::TooLarge)));

        let err = engine.forward(&named("odd"), request_message(9)).await.unwrap_err();
        assert!(matches!(err, RelayError::PolicyViolation));

        assert_eq!(engine.gateway().leases.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_plain_error_body_is_gateway_error() {
        let engine = engine(|| {
            Ok(GatewayResponse {
                status: StatusCode::OK,
                content_type: Some("text/plain".into()),
                body: Bytes::from_static(b"key config mismatch"),
            })
        });
        let err = engine.forward(&named("g1"), request_message(32)).await.unwrap_err();
        assert!(matches!(err, RelayError::GatewayError(_)));
    }

    #[tokio::test]
    async fn test_error_status_is_gateway_error() {
        let engine = engine(|| {
            Ok(GatewayResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                content_type: Some("message/ohttp-res".into()),
                body: Bytes::from_static(b"x"),
            })
        });
        let err = engine.forward(&named("g1"), request_message(32)).await.unwrap_err();
        assert!(matches!(err, RelayError::GatewayError(_)));
    }

    #[tokio::test]
    async fn test_send_failure_is_not_retried() {
        let engine = engine(|| Err(RelayError::GatewayTimeout));
        let err = engine.forward(&named("g1"), request_message(32)).await.unwrap_err();

        assert!(matches!(err, RelayError::GatewayTimeout));
        let mock = engine.gateway();
        assert_eq!(mock.sends.load(Ordering::SeqCst), 1);
        assert_eq!(mock.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_oversized_response_rejected() {
        let response = GatewayResponse {
            status: StatusCode::OK,
            content_type: Some("message/ohttp-res".into()),
            body: Bytes::from(vec![0u8; 17]),
        };
        assert!(matches!(interpret_response(response, 16), Err(RelayError::GatewayError(_))));
    }
}

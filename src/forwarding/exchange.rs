//! A single relay exchange.

use std::sync::Arc;

use crate::framing::EncapsulatedMessage;
use crate::routing::GatewayTarget;

/// One inbound message bound to the gateway it will be forwarded to.
///
/// Created per inbound call and consumed by the engine; it is never shared
/// between exchanges.
#[derive(Debug)]
pub struct ForwardingRequest {
    target: Arc<GatewayTarget>,
    message: EncapsulatedMessage,
}

impl ForwardingRequest {
    pub(crate) fn new(target: Arc<GatewayTarget>, message: EncapsulatedMessage) -> Self {
        Self { target, message }
    }

    pub fn into_parts(self) -> (Arc<GatewayTarget>, EncapsulatedMessage) {
        (self.target, self.message)
    }
}

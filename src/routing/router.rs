//! Gateway allow-list lookup.
//!
//! # Responsibilities
//! - Store resolved gateway targets
//! - Look up the target named by a selector
//! - Return matched target or explicit UnknownGateway
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) lookup via HashMap

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::routing::selector::TargetSelector;
use crate::routing::target::GatewayTarget;

/// Immutable set of permitted gateway targets.
#[derive(Debug, Default)]
pub struct GatewayRegistry {
    targets: HashMap<String, Arc<GatewayTarget>>,
    default_gateway: Option<String>,
}

impl GatewayRegistry {
    /// Build the registry from validated configuration.
    ///
    /// Entries whose endpoint fails to parse are skipped with a warning;
    /// validation rejects them before this point in normal startup.
    pub fn from_config(config: &RelayConfig) -> Self {
        let mut targets = HashMap::new();
        for gateway in &config.gateways {
            match GatewayTarget::from_config(gateway, config) {
                Ok(target) => {
                    targets.insert(gateway.name.clone(), Arc::new(target));
                }
                Err(e) => {
                    tracing::warn!(gateway = %gateway.name, error = %e, "Invalid gateway endpoint");
                }
            }
        }

        Self {
            targets,
            default_gateway: config.routing.default_gateway.clone(),
        }
    }

    /// Resolve a selector to a permitted target.
    pub fn resolve(&self, selector: &TargetSelector) -> RelayResult<Arc<GatewayTarget>> {
        let name = match selector {
            TargetSelector::Named(name) => Some(name.as_str()),
            TargetSelector::Default => self.default_gateway.as_deref(),
        };

        name.and_then(|n| self.targets.get(n))
            .cloned()
            .ok_or(RelayError::UnknownGateway)
    }

    pub fn targets(&self) -> impl Iterator<Item = &Arc<GatewayTarget>> {
        self.targets.values()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

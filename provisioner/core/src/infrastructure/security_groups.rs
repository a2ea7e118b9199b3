// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Security Group Registry
//!
//! In-memory `NetworkGrantSink` that records directional ingress rules
//! between known security groups. Registering the same rule twice keeps a
//! single entry; rules are reported in first-registration order.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Collect the firewall rules of a deployment plan
//! - **Pattern:** Adapter (Hexagonal Architecture)

use crate::domain::network::{AccessRule, GrantError, NetworkGrantSink, NetworkPrincipal, Port};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct RuleSet {
    groups: HashSet<NetworkPrincipal>,
    seen: HashSet<AccessRule>,
    ordered: Vec<AccessRule>,
}

#[derive(Clone, Default)]
pub struct SecurityGroupRegistry {
    inner: Arc<RwLock<RuleSet>>,
}

impl SecurityGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a security group that rules may reference
    pub fn register_group(&self, group: NetworkPrincipal) {
        self.inner.write().groups.insert(group);
    }

    pub fn rules(&self) -> Vec<AccessRule> {
        self.inner.read().ordered.clone()
    }

    pub fn rule_count(&self) -> usize {
        self.inner.read().ordered.len()
    }
}

impl NetworkGrantSink for SecurityGroupRegistry {
    fn allow_access(
        &self,
        from: &NetworkPrincipal,
        to: &NetworkPrincipal,
        port: Port,
    ) -> Result<(), GrantError> {
        let mut set = self.inner.write();

        for principal in [from, to] {
            if !set.groups.contains(principal) {
                return Err(GrantError::UnknownPrincipal(principal.clone()));
            }
        }

        let rule = AccessRule::new(from.clone(), to.clone(), port);
        if set.seen.insert(rule.clone()) {
            debug!("Added ingress rule: {}", rule);
            set.ordered.push(rule);
        }
        Ok(())
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Network Access Domain Types
//!
//! Value objects for firewall rule emission and the `NetworkGrantSink`
//! anti-corruption trait. The sink stands in for the security-group
//! primitive of the underlying infrastructure framework; rule storage,
//! de-duplication and provisioning are the sink's responsibility.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Network principals, ports and directional allow rules

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Value Objects
// ============================================================================

/// Transport protocol of a firewall rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single protocol/port pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Port {
    pub protocol: Protocol,
    #[serde(rename = "port")]
    pub number: u16,
}

impl Port {
    pub fn tcp(number: u16) -> Self {
        Self {
            protocol: Protocol::Tcp,
            number,
        }
    }

    pub fn udp(number: u16) -> Self {
        Self {
            protocol: Protocol::Udp,
            number,
        }
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.protocol, self.number)
    }
}

/// Addressable entity that firewall rules can name as source or destination
///
/// Typically a security group identifier. The value is opaque to the domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkPrincipal(pub String);

impl NetworkPrincipal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NetworkPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directional allow rule: traffic from `source` may reach `destination` on `port`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessRule {
    pub source: NetworkPrincipal,
    pub destination: NetworkPrincipal,
    #[serde(flatten)]
    pub port: Port,
}

impl AccessRule {
    pub fn new(source: NetworkPrincipal, destination: NetworkPrincipal, port: Port) -> Self {
        Self {
            source,
            destination,
            port,
        }
    }
}

impl std::fmt::Display for AccessRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {} ({})", self.source, self.destination, self.port)
    }
}

// ============================================================================
// Collaborator Trait
// ============================================================================

/// Accepts directional allow rules between network principals.
///
/// Implementations must be idempotent: registering the same
/// (source, destination, protocol, port) tuple twice yields one rule.
pub trait NetworkGrantSink: Send + Sync {
    /// Register a rule allowing `from` to reach `to` on `port`
    fn allow_access(
        &self,
        from: &NetworkPrincipal,
        to: &NetworkPrincipal,
        port: Port,
    ) -> Result<(), GrantError>;
}

// ============================================================================
// Domain Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum GrantError {
    #[error("Unknown network principal: {0}")]
    UnknownPrincipal(NetworkPrincipal),

    #[error("Failed to register access rule {rule}: {reason}")]
    Rejected { rule: AccessRule, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_constructors() {
        assert_eq!(Port::tcp(2049).protocol, Protocol::Tcp);
        assert_eq!(Port::udp(111).protocol, Protocol::Udp);
        assert_eq!(Port::udp(111).number, 111);
    }

    #[test]
    fn test_port_display() {
        assert_eq!(Port::tcp(2049).to_string(), "tcp/2049");
        assert_eq!(Port::udp(111).to_string(), "udp/111");
    }

    #[test]
    fn test_port_yaml_shape() {
        let port: Port = serde_yaml::from_str("protocol: udp\nport: 5678\n").unwrap();
        assert_eq!(port, Port::udp(5678));
    }

    #[test]
    fn test_access_rule_display() {
        let rule = AccessRule::new(
            NetworkPrincipal::new("sg-worker"),
            NetworkPrincipal::new("sg-nfs"),
            Port::tcp(111),
        );
        assert_eq!(rule.to_string(), "sg-worker -> sg-nfs (tcp/111)");
    }
}

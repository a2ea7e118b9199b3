// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Launch instance: a `MountingInstance` backed by rendered user data and a
//! shared security group registry.

use crate::domain::artifact::GrantPrincipal;
use crate::domain::boot_script::BootScriptSink;
use crate::domain::instance::{MountingInstance, OperatingSystemKind};
use crate::domain::network::{NetworkGrantSink, NetworkPrincipal};
use crate::infrastructure::security_groups::SecurityGroupRegistry;
use crate::infrastructure::user_data::UserData;

pub struct LaunchInstance {
    name: String,
    security_group: NetworkPrincipal,
    role: GrantPrincipal,
    user_data: UserData,
    network: SecurityGroupRegistry,
}

impl LaunchInstance {
    pub fn new(
        name: impl Into<String>,
        os: OperatingSystemKind,
        security_group: NetworkPrincipal,
        role: GrantPrincipal,
        network: SecurityGroupRegistry,
    ) -> Self {
        network.register_group(security_group.clone());
        Self {
            name: name.into(),
            security_group,
            role,
            user_data: UserData::for_os(os),
            network,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rendered user data for this instance
    pub fn user_data_document(&self) -> &UserData {
        &self.user_data
    }
}

impl MountingInstance for LaunchInstance {
    fn os_type(&self) -> OperatingSystemKind {
        self.user_data.os()
    }

    fn network_identity(&self) -> &NetworkPrincipal {
        &self.security_group
    }

    fn grant_principal(&self) -> &GrantPrincipal {
        &self.role
    }

    fn user_data(&self) -> &dyn BootScriptSink {
        &self.user_data
    }

    fn network(&self) -> &dyn NetworkGrantSink {
        &self.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::network::Port;

    #[test]
    fn test_registers_own_group() {
        let network = SecurityGroupRegistry::new();
        network.register_group(NetworkPrincipal::new("sg-nfs"));
        let instance = LaunchInstance::new(
            "worker",
            OperatingSystemKind::Linux,
            NetworkPrincipal::new("sg-worker"),
            GrantPrincipal::new("role-worker"),
            network.clone(),
        );

        instance
            .network()
            .allow_access(
                instance.network_identity(),
                &NetworkPrincipal::new("sg-nfs"),
                Port::tcp(2049),
            )
            .unwrap();

        assert_eq!(network.rule_count(), 1);
        assert_eq!(instance.os_type(), OperatingSystemKind::Linux);
        assert_eq!(instance.name(), "worker");
    }
}

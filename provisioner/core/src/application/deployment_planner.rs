// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployment Planner
//!
//! Compiles every mount directive of a deployment manifest against launch
//! instances, a shared security group registry and an in-memory artifact
//! store, and collects the result into a serializable plan.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Whole-manifest compilation use case

use crate::application::mountable_nfs::MountableNfs;
use crate::application::script_bundle::ScriptBundleRegistry;
use crate::domain::artifact::{Artifact, GrantPrincipal};
use crate::domain::deployment_config::DeploymentManifest;
use crate::domain::instance::OperatingSystemKind;
use crate::domain::mount::MountableLinuxFilesystem;
use crate::domain::network::AccessRule;
use crate::infrastructure::artifact_store::InMemoryArtifactStore;
use crate::infrastructure::instance::LaunchInstance;
use crate::infrastructure::security_groups::SecurityGroupRegistry;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Rendered boot configuration of one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedInstance {
    pub name: String,
    pub os: OperatingSystemKind,
    pub user_data: String,
}

/// A registered artifact with every principal allowed to read it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedArtifact {
    #[serde(flatten)]
    pub artifact: Artifact,
    pub readers: Vec<GrantPrincipal>,
}

/// Output of compiling a deployment manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub deployment: String,
    pub instances: Vec<PlannedInstance>,
    /// De-duplicated, in first-registration order
    pub ingress_rules: Vec<AccessRule>,
    pub artifacts: Vec<PlannedArtifact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl DeploymentPlan {
    pub fn instance(&self, name: &str) -> Option<&PlannedInstance> {
        self.instances.iter().find(|i| i.name == name)
    }
}

#[derive(Debug, Default)]
pub struct DeploymentPlanner;

impl DeploymentPlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(&self, manifest: &DeploymentManifest) -> anyhow::Result<DeploymentPlan> {
        let warnings = manifest
            .validate()
            .context("Invalid deployment manifest")?;
        for warning in &warnings {
            warn!("{}", warning);
        }

        let unit = manifest.deployment_unit();
        let spec = &manifest.spec;

        let network = SecurityGroupRegistry::new();
        for host in &spec.hosts {
            network.register_group(host.security_group.clone());
        }

        let store = Arc::new(InMemoryArtifactStore::new(&spec.assets.bucket));
        let bundles = Arc::new(ScriptBundleRegistry::for_scripts_dir(
            store.clone(),
            &spec.assets.source_directory,
        ));

        let instances: Vec<LaunchInstance> = spec
            .instances
            .iter()
            .map(|i| {
                LaunchInstance::new(
                    &i.name,
                    i.os,
                    i.security_group.clone(),
                    i.role.clone(),
                    network.clone(),
                )
            })
            .collect();

        for (index, mount) in spec.mounts.iter().enumerate() {
            let target = instances
                .iter()
                .find(|i| i.name() == mount.instance)
                .ok_or_else(|| anyhow::anyhow!("mounts[{}]: unknown instance '{}'", index, mount.instance))?;

            let config = mount
                .nfs
                .resolve(&spec.hosts)
                .with_context(|| format!("mounts[{}]: invalid nfs configuration", index))?;
            let filesystem: Box<dyn MountableLinuxFilesystem> =
                Box::new(MountableNfs::new(unit.clone(), bundles.clone(), config));

            filesystem
                .mount_to_linux_instance(target, &mount.mount_point)
                .with_context(|| {
                    format!(
                        "mounts[{}]: failed to mount {}:{} onto instance '{}'",
                        index, mount.nfs.host, mount.nfs.export_path, mount.instance
                    )
                })?;
        }

        let planned_instances = instances
            .iter()
            .map(|instance| {
                let user_data = instance.user_data_document();
                user_data.seal();
                PlannedInstance {
                    name: instance.name().to_string(),
                    os: user_data.os(),
                    user_data: user_data.render(),
                }
            })
            .collect();

        let artifacts = store
            .artifacts()
            .into_iter()
            .map(|artifact| PlannedArtifact {
                readers: store.readers(&artifact),
                artifact,
            })
            .collect();

        let plan = DeploymentPlan {
            deployment: unit.to_string(),
            instances: planned_instances,
            ingress_rules: network.rules(),
            artifacts,
            warnings,
        };

        info!(
            "Planned deployment {}: {} instance(s), {} mount(s), {} ingress rule(s)",
            plan.deployment,
            plan.instances.len(),
            spec.mounts.len(),
            plan.ingress_rules.len()
        );
        Ok(plan)
    }
}

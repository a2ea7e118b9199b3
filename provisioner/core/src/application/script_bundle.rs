// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Script Bundle Registry
//!
//! Resolves the mount helper bundle for a deployment unit, registering it
//! with the artifact store on first use.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** At most one bundle artifact per deployment unit

use crate::domain::artifact::{
    Artifact, ArtifactError, ArtifactId, ArtifactStore, BundleSource, DeploymentUnitId,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// File name of the mount helper inside the bundle
pub const MOUNT_HELPER_SCRIPT: &str = "mountNfs.sh";

const SCRIPT_BUNDLE_UUID: Uuid = Uuid::from_u128(0xbc791c1b_2b48_4712_bf58_0f96e31320c6);

/// Fixed identifier of the mount helper bundle in every deployment unit
pub fn script_bundle_id() -> ArtifactId {
    ArtifactId::new(format!("MountableNfsAsset{}", SCRIPT_BUNDLE_UUID.simple()))
}

/// Keyed registry mapping each deployment unit to its bundle artifact.
///
/// `resolve` performs find-or-create while holding the registry lock, so
/// concurrent callers for the same unit observe a single `create` on the
/// store.
pub struct ScriptBundleRegistry {
    store: Arc<dyn ArtifactStore>,
    source: BundleSource,
    bundle_id: ArtifactId,
    artifacts: Mutex<HashMap<DeploymentUnitId, Artifact>>,
}

impl ScriptBundleRegistry {
    pub fn new(store: Arc<dyn ArtifactStore>, source: BundleSource) -> Self {
        Self {
            store,
            source,
            bundle_id: script_bundle_id(),
            artifacts: Mutex::new(HashMap::new()),
        }
    }

    /// Registry bundling only the mount helper from `scripts_dir`
    pub fn for_scripts_dir(store: Arc<dyn ArtifactStore>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            store,
            BundleSource::new(scripts_dir, vec![MOUNT_HELPER_SCRIPT.to_string()]),
        )
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Bundle artifact for `unit`, created on first reference
    pub fn resolve(&self, unit: &DeploymentUnitId) -> Result<Artifact, ArtifactError> {
        let mut artifacts = self.artifacts.lock();

        if let Some(artifact) = artifacts.get(unit) {
            debug!("Script bundle cache hit: unit={}", unit);
            return Ok(artifact.clone());
        }

        let artifact = match self.store.find_existing(unit, &self.bundle_id)? {
            Some(existing) => {
                debug!(
                    "Reusing registered script bundle: unit={}, key={}",
                    unit, existing.location.object_key
                );
                existing
            }
            None => {
                let created = self.store.create(unit, &self.bundle_id, &self.source)?;
                info!(
                    "Registered script bundle: unit={}, location={}",
                    unit,
                    created.location.to_uri()
                );
                created
            }
        };

        artifacts.insert(unit.clone(), artifact.clone());
        Ok(artifact)
    }

    /// Artifacts resolved so far, ordered by deployment unit
    pub fn resolved(&self) -> Vec<Artifact> {
        let mut artifacts: Vec<Artifact> = self.artifacts.lock().values().cloned().collect();
        artifacts.sort_by(|a, b| a.deployment_unit.cmp(&b.deployment_unit));
        artifacts
    }
}

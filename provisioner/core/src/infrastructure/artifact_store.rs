// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-Memory Artifact Store
//!
//! `ArtifactStore` that content-addresses bundle sources without uploading
//! them. The object key of an artifact is the SHA-256 of its included
//! files, so identical sources always map to the same key.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Artifact registration and read grants for deployment plans
//! - **Pattern:** Adapter (Hexagonal Architecture)

use crate::domain::artifact::{
    Artifact, ArtifactError, ArtifactId, ArtifactLocation, ArtifactStore, BundleSource,
    DeploymentUnitId, GrantPrincipal,
};
use chrono::Utc;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

type ArtifactKey = (DeploymentUnitId, ArtifactId);

#[derive(Clone)]
pub struct InMemoryArtifactStore {
    bucket: String,
    artifacts: Arc<RwLock<HashMap<ArtifactKey, Artifact>>>,
    grants: Arc<RwLock<HashMap<ArtifactKey, BTreeSet<GrantPrincipal>>>>,
}

impl InMemoryArtifactStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            artifacts: Arc::new(RwLock::new(HashMap::new())),
            grants: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Every registered artifact, ordered by unit then id
    pub fn artifacts(&self) -> Vec<Artifact> {
        let mut artifacts: Vec<Artifact> = self.artifacts.read().values().cloned().collect();
        artifacts.sort_by(|a, b| {
            (&a.deployment_unit, &a.id).cmp(&(&b.deployment_unit, &b.id))
        });
        artifacts
    }

    /// Principals allowed to read `artifact`
    pub fn readers(&self, artifact: &Artifact) -> Vec<GrantPrincipal> {
        self.grants
            .read()
            .get(&key_of(artifact))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

fn key_of(artifact: &Artifact) -> ArtifactKey {
    (artifact.deployment_unit.clone(), artifact.id.clone())
}

/// Hex SHA-256 over the included files of `source`.
///
/// Files are hashed in relative-path order; each contributes its path, a NUL
/// separator and its bytes. Every name in `source.include` must exist.
pub fn fingerprint(source: &BundleSource) -> Result<String, ArtifactError> {
    let root = source.directory.as_path();
    if !root.is_dir() {
        return Err(ArtifactError::SourceNotFound(root.display().to_string()));
    }

    let wanted: BTreeSet<&str> = source.include.iter().map(String::as_str).collect();
    let mut files: BTreeMap<String, Vec<u8>> = BTreeMap::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| ArtifactError::IoError(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = relative_name(root, entry.path());
        if !wanted.contains(relative.as_str()) {
            continue;
        }

        let bytes = std::fs::read(entry.path()).map_err(|e| {
            ArtifactError::IoError(format!("{}: {}", entry.path().display(), e))
        })?;
        files.insert(relative, bytes);
    }

    if let Some(missing) = wanted.iter().find(|name| !files.contains_key(**name)) {
        return Err(ArtifactError::SourceNotFound(
            root.join(missing).display().to_string(),
        ));
    }

    let mut hasher = Sha256::new();
    for (name, bytes) in &files {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(bytes);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Relative path with `/` separators
fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl ArtifactStore for InMemoryArtifactStore {
    fn find_existing(
        &self,
        unit: &DeploymentUnitId,
        id: &ArtifactId,
    ) -> Result<Option<Artifact>, ArtifactError> {
        Ok(self
            .artifacts
            .read()
            .get(&(unit.clone(), id.clone()))
            .cloned())
    }

    fn create(
        &self,
        unit: &DeploymentUnitId,
        id: &ArtifactId,
        source: &BundleSource,
    ) -> Result<Artifact, ArtifactError> {
        let key = (unit.clone(), id.clone());
        if self.artifacts.read().contains_key(&key) {
            return Err(ArtifactError::AlreadyExists {
                unit: unit.clone(),
                id: id.clone(),
            });
        }

        let content_hash = fingerprint(source)?;
        let artifact = Artifact {
            id: id.clone(),
            deployment_unit: unit.clone(),
            location: ArtifactLocation::new(&self.bucket, format!("{}.zip", content_hash)),
            content_hash,
            created_at: Utc::now(),
        };

        let mut artifacts = self.artifacts.write();
        if artifacts.contains_key(&key) {
            return Err(ArtifactError::AlreadyExists {
                unit: unit.clone(),
                id: id.clone(),
            });
        }
        artifacts.insert(key, artifact.clone());

        info!(
            "Created artifact {} in {} at {}",
            id,
            unit,
            artifact.location.to_uri()
        );
        Ok(artifact)
    }

    fn grant_read(
        &self,
        artifact: &Artifact,
        principal: &GrantPrincipal,
    ) -> Result<(), ArtifactError> {
        let key = key_of(artifact);
        if !self.artifacts.read().contains_key(&key) {
            return Err(ArtifactError::NotFound {
                unit: artifact.deployment_unit.clone(),
                id: artifact.id.clone(),
            });
        }

        if self
            .grants
            .write()
            .entry(key)
            .or_default()
            .insert(principal.clone())
        {
            debug!("Granted read on {} to {}", artifact.id, principal);
        }
        Ok(())
    }
}

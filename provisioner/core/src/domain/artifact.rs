// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Artifact Store Trait - Anti-Corruption Layer for Asset Storage
//!
//! Artifacts are immutable, content-addressed file bundles that live in an
//! external object store and are downloaded by instances at boot time.
//! The `ArtifactStore` trait isolates the domain from the storage backend
//! (bucket uploads, IAM policies) so the compiler can be tested with
//! in-memory implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Value Objects
// ============================================================================

/// Scope within which artifacts are de-duplicated (one provisioned stack)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentUnitId(pub String);

impl DeploymentUnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for DeploymentUnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an artifact inside a deployment unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub String);

impl ArtifactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity that can be granted read access to an artifact (e.g. an instance role)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantPrincipal(pub String);

impl GrantPrincipal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for GrantPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an artifact can be fetched from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub bucket: String,
    pub object_key: String,
}

impl ArtifactLocation {
    pub fn new(bucket: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object_key: object_key.into(),
        }
    }

    /// `s3://bucket/key` form used by download commands
    pub fn to_uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.object_key)
    }
}

/// Files that make up a bundle: a source directory and the relative file
/// names to include from it. Everything else in the directory is excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSource {
    pub directory: PathBuf,
    pub include: Vec<String>,
}

impl BundleSource {
    pub fn new(directory: impl Into<PathBuf>, include: Vec<String>) -> Self {
        Self {
            directory: directory.into(),
            include,
        }
    }
}

/// A registered bundle artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub deployment_unit: DeploymentUnitId,
    pub location: ArtifactLocation,
    /// Hex SHA-256 over the bundle contents
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn location(&self) -> &ArtifactLocation {
        &self.location
    }
}

// ============================================================================
// Collaborator Trait
// ============================================================================

/// Artifact storage backend
///
/// `create` registers a new artifact and must not be called twice for the
/// same (unit, id) pair; callers resolve through `find_existing` first.
/// `grant_read` is idempotent.
pub trait ArtifactStore: Send + Sync {
    /// Look up an already registered artifact
    fn find_existing(
        &self,
        unit: &DeploymentUnitId,
        id: &ArtifactId,
    ) -> Result<Option<Artifact>, ArtifactError>;

    /// Register a new artifact built from `source`
    fn create(
        &self,
        unit: &DeploymentUnitId,
        id: &ArtifactId,
        source: &BundleSource,
    ) -> Result<Artifact, ArtifactError>;

    /// Allow `principal` to read `artifact`
    fn grant_read(&self, artifact: &Artifact, principal: &GrantPrincipal)
        -> Result<(), ArtifactError>;
}

// ============================================================================
// Domain Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact {id} already exists in deployment unit {unit}")]
    AlreadyExists {
        unit: DeploymentUnitId,
        id: ArtifactId,
    },

    #[error("Artifact {id} not found in deployment unit {unit}")]
    NotFound {
        unit: DeploymentUnitId,
        id: ArtifactId,
    },

    #[error("Bundle source not found: {0}")]
    SourceNotFound(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Deployment Manifest Types
//
// Defines the configuration schema for one deployment unit:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Asset bucket and mount helper source directory
// - NFS hosts and launch instances with their network principals
// - Mount directives binding an NFS export to an instance path

use crate::domain::artifact::{DeploymentUnitId, GrantPrincipal};
use crate::domain::instance::OperatingSystemKind;
use crate::domain::mount::{LinuxMountPoint, MountableNfsConfig, NfsVersion};
use crate::domain::network::{NetworkPrincipal, Port};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "nfsboot/v1";
pub const KIND: &str = "Deployment";

/// Top-level Kubernetes-style deployment manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentManifest {
    /// API version (must be "nfsboot/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "Deployment")
    pub kind: String,

    /// Deployment metadata; `name` identifies the deployment unit
    pub metadata: ManifestMetadata,

    /// Deployment specification
    pub spec: DeploymentSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Deployment unit name; artifacts are de-duplicated per name
    pub name: String,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Deployment specification (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentSpec {
    /// Where the mount helper bundle comes from and is published to
    #[serde(default)]
    pub assets: AssetsConfig,

    /// NFS servers that instances mount from
    #[serde(default)]
    pub hosts: Vec<HostConfig>,

    /// Instances receiving mount directives
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,

    /// Mount directives, compiled in order
    #[serde(default)]
    pub mounts: Vec<MountDirectiveConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Bucket that bundle artifacts are published to
    #[serde(default = "default_asset_bucket")]
    pub bucket: String,

    /// Directory containing `mountNfs.sh`
    /// Default: "scripts/bash" (relative to the working directory)
    #[serde(default = "default_source_directory")]
    pub source_directory: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            bucket: default_asset_bucket(),
            source_directory: default_source_directory(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Name referenced by `mounts[].nfs.host_access`
    pub name: String,

    /// Security group guarding the NFS server
    pub security_group: NetworkPrincipal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Unique instance name
    pub name: String,

    /// Operating system family (default: linux)
    #[serde(default)]
    pub os: OperatingSystemKind,

    /// The instance's own security group
    pub security_group: NetworkPrincipal,

    /// Role used for artifact read grants
    pub role: GrantPrincipal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountDirectiveConfig {
    /// Name of the instance to mount onto
    pub instance: String,

    /// Location and permissions on the instance
    #[serde(flatten)]
    pub mount_point: LinuxMountPoint,

    /// The NFS export to mount
    pub nfs: NfsMountConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NfsMountConfig {
    /// "nfs" (v3) or "nfs4"
    pub version: NfsVersion,

    /// Hostname or IP of the NFS server
    pub host: String,

    /// Exported path on the server
    pub export_path: String,

    /// Name of a `hosts` entry to grant access to (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_access: Option<String>,

    /// Ports beyond 111 and 2049 (tcp/udp)
    #[serde(default)]
    pub extra_ports: Vec<Port>,

    /// Extra mount options, joined by commas after the permission option
    #[serde(default)]
    pub extra_mount_options: Vec<String>,
}

impl NfsMountConfig {
    /// Build the domain configuration, resolving `host_access` against `hosts`
    pub fn resolve(&self, hosts: &[HostConfig]) -> anyhow::Result<MountableNfsConfig> {
        let mut config = MountableNfsConfig::new(self.version, &self.host, &self.export_path)?
            .with_extra_ports(self.extra_ports.iter().copied())
            .with_extra_mount_options(self.extra_mount_options.iter().cloned());

        if let Some(name) = &self.host_access {
            let host = hosts
                .iter()
                .find(|h| &h.name == name)
                .ok_or_else(|| anyhow::anyhow!("Unknown host '{}' in host_access", name))?;
            config = config.with_host_access(host.security_group.clone());
        }

        Ok(config)
    }
}

// Default value functions
fn default_asset_bucket() -> String {
    "nfsboot-assets".to_string()
}

fn default_source_directory() -> PathBuf {
    PathBuf::from("scripts/bash")
}

impl DeploymentManifest {
    /// Load manifest from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest = serde_yaml::from_str(&content)?;
        Ok(manifest)
    }

    /// Save manifest to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse manifest from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let manifest = serde_yaml::from_str(yaml)?;
        Ok(manifest)
    }

    /// Discover manifest file using precedence order
    /// 1. NFSBOOT_CONFIG_PATH environment variable
    /// 2. ./nfsboot.yaml (working directory)
    /// 3. ~/.nfsboot/deployment.yaml (user home)
    /// 4. /etc/nfsboot/deployment.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("NFSBOOT_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./nfsboot.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".nfsboot").join("deployment.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/nfsboot/deployment.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load manifest from the explicit path, or discover it
    pub fn load(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let path = match cli_path {
            Some(path) => {
                tracing::info!("Loading manifest from explicit path: {:?}", path);
                path
            }
            None => {
                let path = Self::discover_config().ok_or_else(|| {
                    anyhow::anyhow!(
                        "No deployment manifest found. Pass --config or create ./nfsboot.yaml"
                    )
                })?;
                tracing::info!("Loading manifest from discovered path: {:?}", path);
                path
            }
        };

        let mut manifest = Self::from_yaml_file(&path)
            .with_context(|| format!("Failed to load manifest at {:?}", path))?;
        manifest.apply_env_overrides();
        Ok(manifest)
    }

    /// Apply environment variable overrides to the manifest
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bucket) = lookup("NFSBOOT_ASSET_BUCKET") {
            tracing::info!("Environment override: NFSBOOT_ASSET_BUCKET={}", bucket);
            self.spec.assets.bucket = bucket;
        }

        if let Some(dir) = lookup("NFSBOOT_SCRIPTS_DIR") {
            tracing::info!("Environment override: NFSBOOT_SCRIPTS_DIR={}", dir);
            self.spec.assets.source_directory = PathBuf::from(dir);
        }
    }

    /// Deployment unit that artifacts of this manifest are scoped to
    pub fn deployment_unit(&self) -> DeploymentUnitId {
        DeploymentUnitId::new(&self.metadata.name)
    }

    pub fn instance(&self, name: &str) -> Option<&InstanceConfig> {
        self.spec.instances.iter().find(|i| i.name == name)
    }

    /// Validate manifest
    ///
    /// Returns non-fatal warnings on success.
    pub fn validate(&self) -> anyhow::Result<Vec<String>> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.assets.bucket.is_empty() {
            anyhow::bail!("spec.assets.bucket cannot be empty");
        }

        let mut host_names = HashSet::new();
        for host in &self.spec.hosts {
            if host.name.is_empty() {
                anyhow::bail!("Host name cannot be empty");
            }
            if !host_names.insert(host.name.as_str()) {
                anyhow::bail!("Duplicate host name: {}", host.name);
            }
        }

        let mut instance_names = HashSet::new();
        for instance in &self.spec.instances {
            if instance.name.is_empty() {
                anyhow::bail!("Instance name cannot be empty");
            }
            if !instance_names.insert(instance.name.as_str()) {
                anyhow::bail!("Duplicate instance name: {}", instance.name);
            }
        }

        let mut warnings = Vec::new();
        for (index, mount) in self.spec.mounts.iter().enumerate() {
            if !instance_names.contains(mount.instance.as_str()) {
                anyhow::bail!(
                    "mounts[{}]: unknown instance '{}'",
                    index,
                    mount.instance
                );
            }

            mount
                .nfs
                .resolve(&self.spec.hosts)
                .with_context(|| format!("mounts[{}]: invalid nfs configuration", index))?;

            if mount.nfs.host_access.is_none() && !mount.nfs.extra_ports.is_empty() {
                warnings.push(format!(
                    "mounts[{}]: extra_ports have no effect without host_access",
                    index
                ));
            }
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
apiVersion: nfsboot/v1
kind: Deployment
metadata:
  name: render-farm
spec:
  assets:
    bucket: farm-assets
  hosts:
    - name: fileserver
      security_group: sg-nfs
  instances:
    - name: worker
      security_group: sg-worker
      role: worker-role
  mounts:
    - instance: worker
      location: /mnt/nfs
      nfs:
        version: nfs4
        host: server.dns
        export_path: /export
        host_access: fileserver
        extra_ports:
          - protocol: tcp
            port: 1234
"#;

    #[test]
    fn test_parse_sample() {
        let manifest = DeploymentManifest::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(manifest.deployment_unit(), DeploymentUnitId::new("render-farm"));
        assert_eq!(manifest.spec.assets.bucket, "farm-assets");
        assert_eq!(manifest.spec.assets.source_directory, PathBuf::from("scripts/bash"));
        assert_eq!(manifest.spec.instances[0].os, OperatingSystemKind::Linux);

        let mount = &manifest.spec.mounts[0];
        assert_eq!(mount.mount_point.location, "/mnt/nfs");
        assert_eq!(mount.nfs.extra_ports, vec![Port::tcp(1234)]);
    }

    #[test]
    fn test_resolve_host_access() {
        let manifest = DeploymentManifest::from_yaml_str(SAMPLE).unwrap();
        let config = manifest.spec.mounts[0]
            .nfs
            .resolve(&manifest.spec.hosts)
            .unwrap();
        assert_eq!(config.host_access(), Some(&NetworkPrincipal::new("sg-nfs")));
        assert_eq!(config.version(), NfsVersion::Nfs4);
    }

    #[test]
    fn test_validation() {
        let mut manifest = DeploymentManifest::from_yaml_str(SAMPLE).unwrap();
        assert!(manifest.validate().unwrap().is_empty());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.mounts[0].instance = "missing".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.mounts[0].instance = "worker".to_string();

        manifest.spec.mounts[0].nfs.host_access = Some("nowhere".to_string());
        assert!(manifest.validate().is_err());

        manifest.spec.mounts[0].nfs.host_access = None;
        let warnings = manifest.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("extra_ports"));
    }

    #[test]
    fn test_duplicate_instance_rejected() {
        let mut manifest = DeploymentManifest::from_yaml_str(SAMPLE).unwrap();
        let duplicate = manifest.spec.instances[0].clone();
        manifest.spec.instances.push(duplicate);
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_empty_nfs_host_rejected() {
        let mut manifest = DeploymentManifest::from_yaml_str(SAMPLE).unwrap();
        manifest.spec.mounts[0].nfs.host = String::new();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut manifest = DeploymentManifest::from_yaml_str(SAMPLE).unwrap();
        manifest.apply_overrides_from(|key| match key {
            "NFSBOOT_ASSET_BUCKET" => Some("override-bucket".to_string()),
            "NFSBOOT_SCRIPTS_DIR" => Some("/opt/scripts".to_string()),
            _ => None,
        });
        assert_eq!(manifest.spec.assets.bucket, "override-bucket");
        assert_eq!(manifest.spec.assets.source_directory, PathBuf::from("/opt/scripts"));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nfsboot.yaml");
        let manifest = DeploymentManifest::from_yaml_str(SAMPLE).unwrap();
        manifest.to_yaml_file(&path).unwrap();

        let loaded = DeploymentManifest::load(Some(path)).unwrap();
        assert_eq!(loaded.metadata.name, "render-farm");
        assert_eq!(loaded.spec.mounts.len(), 1);
    }
}

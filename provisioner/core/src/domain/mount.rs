// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Mountable Filesystem Domain Model
//!
//! Value objects describing *what* to mount and *where*, plus the
//! `MountableLinuxFilesystem` capability shared by every mount compiler.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Mount configuration, mount points and the compiler contract

use crate::domain::artifact::ArtifactError;
use crate::domain::boot_script::BootScriptError;
use crate::domain::instance::MountingInstance;
use crate::domain::network::{GrantError, NetworkPrincipal, Port};
use crate::domain::path_normalizer::normalize_posix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Value Objects
// ============================================================================

/// NFS client protocol used by the mount helper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NfsVersion {
    /// NFSv3, mounted with filesystem type `nfs`
    #[serde(rename = "nfs", alias = "nfs3")]
    Nfs3,
    /// NFSv4, mounted with filesystem type `nfs4`
    #[serde(rename = "nfs4")]
    Nfs4,
}

impl NfsVersion {
    /// Token passed as the first argument of the mount helper
    pub fn mount_type(&self) -> &'static str {
        match self {
            Self::Nfs3 => "nfs",
            Self::Nfs4 => "nfs4",
        }
    }
}

impl std::fmt::Display for NfsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mount_type())
    }
}

/// Access granted to the mounted filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MountPermissions {
    ReadWrite,
    ReadOnly,
}

impl MountPermissions {
    /// Linux mount option token for this permission
    pub fn to_linux_mount_option(&self) -> &'static str {
        match self {
            Self::ReadWrite => "rw",
            Self::ReadOnly => "r",
        }
    }
}

impl Default for MountPermissions {
    fn default() -> Self {
        Self::ReadWrite
    }
}

/// Where and how a filesystem is mounted on a Linux target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinuxMountPoint {
    /// Directory on the target; normalized before use
    pub location: String,

    /// Default: `ReadWrite`
    #[serde(default)]
    pub permissions: MountPermissions,
}

impl LinuxMountPoint {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            permissions: MountPermissions::default(),
        }
    }

    pub fn with_permissions(mut self, permissions: MountPermissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// `location` with redundant separators and dot segments removed
    pub fn normalized_location(&self) -> String {
        normalize_posix(&self.location)
    }
}

/// Configuration of an NFS export to mount.
///
/// | Field | Default |
/// |-------|---------|
/// | `host_access` | none: no firewall rules are emitted |
/// | `extra_ports` | none, beyond 111 and 2049 over tcp and udp |
/// | `extra_mount_options` | none |
///
/// Construct with [`MountableNfsConfig::new`]; the host address must be
/// non-empty. No other field is validated: export path and mount options
/// are forwarded to the mount helper as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountableNfsConfig {
    version: NfsVersion,
    host: String,
    export_path: String,
    host_access: Option<NetworkPrincipal>,
    extra_ports: Vec<Port>,
    extra_mount_options: Vec<String>,
}

impl MountableNfsConfig {
    pub fn new(
        version: NfsVersion,
        host: impl Into<String>,
        export_path: impl Into<String>,
    ) -> Result<Self, NfsConfigError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(NfsConfigError::EmptyHostAddress);
        }

        Ok(Self {
            version,
            host,
            export_path: export_path.into(),
            host_access: None,
            extra_ports: Vec::new(),
            extra_mount_options: Vec::new(),
        })
    }

    /// Principal of the NFS server that targets must be allowed to reach
    pub fn with_host_access(mut self, principal: NetworkPrincipal) -> Self {
        self.host_access = Some(principal);
        self
    }

    /// Ports beyond the portmapper and nfsd ports that clients need on the host.
    /// Inert unless `with_host_access` is also set.
    pub fn with_extra_ports(mut self, ports: impl IntoIterator<Item = Port>) -> Self {
        self.extra_ports.extend(ports);
        self
    }

    /// Options appended after the permission option, e.g. `soft`, `rsize=4096`
    pub fn with_extra_mount_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_mount_options
            .extend(options.into_iter().map(Into::into));
        self
    }

    pub fn version(&self) -> NfsVersion {
        self.version
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn export_path(&self) -> &str {
        &self.export_path
    }

    pub fn host_access(&self) -> Option<&NetworkPrincipal> {
        self.host_access.as_ref()
    }

    pub fn extra_ports(&self) -> &[Port] {
        &self.extra_ports
    }

    pub fn extra_mount_options(&self) -> &[String] {
        &self.extra_mount_options
    }

    /// Comma-joined option string: permission token, then every extra option in order
    pub fn mount_options(&self, permissions: MountPermissions) -> String {
        std::iter::once(permissions.to_linux_mount_option())
            .chain(self.extra_mount_options.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(",")
    }
}

// ============================================================================
// Capability Trait
// ============================================================================

/// A filesystem that can be mounted onto Linux instances at first boot
pub trait MountableLinuxFilesystem: Send + Sync {
    /// Compile a mount of this filesystem at `mount` into `target`'s
    /// network grants and boot script
    fn mount_to_linux_instance(
        &self,
        target: &dyn MountingInstance,
        mount: &LinuxMountPoint,
    ) -> Result<(), MountError>;
}

// ============================================================================
// Domain Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum MountError {
    #[error("Target instance must be Linux.")]
    UnsupportedPlatform,

    #[error(transparent)]
    Grant(#[from] GrantError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    BootScript(#[from] BootScriptError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NfsConfigError {
    #[error("NFS host address cannot be empty")]
    EmptyHostAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MountableNfsConfig {
        MountableNfsConfig::new(NfsVersion::Nfs3, "server.dns", "/export").unwrap()
    }

    #[test]
    fn test_version_tokens() {
        assert_eq!(NfsVersion::Nfs3.mount_type(), "nfs");
        assert_eq!(NfsVersion::Nfs4.mount_type(), "nfs4");
    }

    #[test]
    fn test_version_yaml_aliases() {
        let v: NfsVersion = serde_yaml::from_str("nfs3").unwrap();
        assert_eq!(v, NfsVersion::Nfs3);
        let v: NfsVersion = serde_yaml::from_str("nfs").unwrap();
        assert_eq!(v, NfsVersion::Nfs3);
        let v: NfsVersion = serde_yaml::from_str("nfs4").unwrap();
        assert_eq!(v, NfsVersion::Nfs4);
    }

    #[test]
    fn test_permissions_default_and_tokens() {
        assert_eq!(MountPermissions::default(), MountPermissions::ReadWrite);
        assert_eq!(MountPermissions::ReadWrite.to_linux_mount_option(), "rw");
        assert_eq!(MountPermissions::ReadOnly.to_linux_mount_option(), "r");
    }

    #[test]
    fn test_mount_options_readonly_without_extras() {
        assert_eq!(config().mount_options(MountPermissions::ReadOnly), "r");
    }

    #[test]
    fn test_mount_options_with_extras_in_order() {
        let config = config().with_extra_mount_options(["x", "y"]);
        assert_eq!(config.mount_options(MountPermissions::ReadWrite), "rw,x,y");
    }

    #[test]
    fn test_empty_host_rejected() {
        let result = MountableNfsConfig::new(NfsVersion::Nfs4, "  ", "/export");
        assert_eq!(result.unwrap_err(), NfsConfigError::EmptyHostAddress);
    }

    #[test]
    fn test_export_path_is_not_validated() {
        let config = MountableNfsConfig::new(NfsVersion::Nfs4, "10.0.0.5", "").unwrap();
        assert_eq!(config.export_path(), "");
    }

    #[test]
    fn test_mount_point_defaults_to_read_write() {
        let mount: LinuxMountPoint = serde_yaml::from_str("location: /mnt//nfs/\n").unwrap();
        assert_eq!(mount.permissions, MountPermissions::ReadWrite);
        assert_eq!(mount.normalized_location(), "/mnt/nfs");
    }

    #[test]
    fn test_unsupported_platform_message_is_stable() {
        assert_eq!(
            MountError::UnsupportedPlatform.to_string(),
            "Target instance must be Linux."
        );
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mountable NFS Application Service
//!
//! Compiles an NFS mount directive into network grants on the target and a
//! download/unpack/execute/cleanup sequence in its boot script.
//!
//! ## Boot script contract
//! The helper's argument parsing is positional, so the emitted lines are
//! fixed:
//!
//! ```text
//! TMPDIR=$(mktemp -d)
//! pushd "$TMPDIR"
//! unzip <downloaded-bundle>
//! bash ./mountNfs.sh <nfs|nfs4> <host> '<export path>' '<mount location>' <options>
//! popd
//! rm -f <downloaded-bundle>
//! ```
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** `MountableLinuxFilesystem` implementation for NFS exports

use crate::application::script_bundle::{ScriptBundleRegistry, MOUNT_HELPER_SCRIPT};
use crate::domain::artifact::DeploymentUnitId;
use crate::domain::instance::MountingInstance;
use crate::domain::mount::{
    LinuxMountPoint, MountError, MountableLinuxFilesystem, MountableNfsConfig,
};
use crate::domain::network::Port;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Portmapper and nfsd; opened over tcp and udp whenever host access is granted
pub const NFS_SERVICE_PORTS: [u16; 2] = [111, 2049];

/// An NFS export mountable onto Linux instances of one deployment unit
pub struct MountableNfs {
    unit: DeploymentUnitId,
    bundles: Arc<ScriptBundleRegistry>,
    config: MountableNfsConfig,
}

impl MountableNfs {
    pub fn new(
        unit: DeploymentUnitId,
        bundles: Arc<ScriptBundleRegistry>,
        config: MountableNfsConfig,
    ) -> Self {
        Self {
            unit,
            bundles,
            config,
        }
    }

    pub fn config(&self) -> &MountableNfsConfig {
        &self.config
    }

    /// Ports the target must reach on the host: the NFS service ports over
    /// both transports, then the configured extras in order
    fn required_ports(&self) -> Vec<Port> {
        NFS_SERVICE_PORTS
            .iter()
            .flat_map(|&n| [Port::tcp(n), Port::udp(n)])
            .chain(self.config.extra_ports().iter().copied())
            .collect()
    }

    /// Command lines unpacking and running the helper from `bundle_path`
    fn mount_commands(&self, bundle_path: &str, mount: &LinuxMountPoint) -> Vec<String> {
        vec![
            "TMPDIR=$(mktemp -d)".to_string(),
            "pushd \"$TMPDIR\"".to_string(),
            format!("unzip {}", bundle_path),
            format!(
                "bash ./{} {} {} '{}' '{}' {}",
                MOUNT_HELPER_SCRIPT,
                self.config.version().mount_type(),
                self.config.host(),
                self.config.export_path(),
                mount.normalized_location(),
                self.config.mount_options(mount.permissions),
            ),
            "popd".to_string(),
            format!("rm -f {}", bundle_path),
        ]
    }
}

impl MountableLinuxFilesystem for MountableNfs {
    fn mount_to_linux_instance(
        &self,
        target: &dyn MountingInstance,
        mount: &LinuxMountPoint,
    ) -> Result<(), MountError> {
        if !target.os_type().is_linux() {
            return Err(MountError::UnsupportedPlatform);
        }

        match self.config.host_access() {
            Some(host) => {
                let source = target.network_identity();
                for port in self.required_ports() {
                    debug!("Granting {} -> {} on {}", source, host, port);
                    target.network().allow_access(source, host, port)?;
                }
            }
            None if !self.config.extra_ports().is_empty() => {
                warn!(
                    "Ignoring {} extra NFS port(s) for {}: no host access principal configured",
                    self.config.extra_ports().len(),
                    self.config.host()
                );
            }
            None => {}
        }

        let bundle = self.bundles.resolve(&self.unit)?;
        self.bundles
            .store()
            .grant_read(&bundle, target.grant_principal())?;

        let bundle_path = target.user_data().add_download_command(bundle.location())?;
        let commands = self.mount_commands(&bundle_path, mount);
        debug!("Appending {} mount commands", commands.len());
        target.user_data().add_commands(&commands)?;

        info!(
            "Compiled NFS mount {}:{} -> {}",
            self.config.host(),
            self.config.export_path(),
            mount.normalized_location()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifact::{
        Artifact, ArtifactError, ArtifactId, ArtifactLocation, ArtifactStore, BundleSource,
        GrantPrincipal,
    };
    use crate::domain::boot_script::{BootScriptError, BootScriptSink};
    use crate::domain::instance::OperatingSystemKind;
    use crate::domain::mount::{MountPermissions, NfsVersion};
    use crate::domain::network::{GrantError, NetworkGrantSink, NetworkPrincipal};
    use chrono::Utc;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FixedStore {
        grants: Mutex<Vec<GrantPrincipal>>,
    }

    impl ArtifactStore for FixedStore {
        fn find_existing(
            &self,
            _unit: &DeploymentUnitId,
            _id: &ArtifactId,
        ) -> Result<Option<Artifact>, ArtifactError> {
            Ok(None)
        }

        fn create(
            &self,
            unit: &DeploymentUnitId,
            id: &ArtifactId,
            _source: &BundleSource,
        ) -> Result<Artifact, ArtifactError> {
            Ok(Artifact {
                id: id.clone(),
                deployment_unit: unit.clone(),
                location: ArtifactLocation::new("assets", "abc.zip"),
                content_hash: "abc".to_string(),
                created_at: Utc::now(),
            })
        }

        fn grant_read(
            &self,
            _artifact: &Artifact,
            principal: &GrantPrincipal,
        ) -> Result<(), ArtifactError> {
            self.grants.lock().push(principal.clone());
            Ok(())
        }
    }

    struct RecordingTarget {
        os: OperatingSystemKind,
        identity: NetworkPrincipal,
        role: GrantPrincipal,
        rules: Mutex<Vec<(NetworkPrincipal, NetworkPrincipal, Port)>>,
        lines: Mutex<Vec<String>>,
    }

    impl RecordingTarget {
        fn new(os: OperatingSystemKind) -> Self {
            Self {
                os,
                identity: NetworkPrincipal::new("sg-client"),
                role: GrantPrincipal::new("role-client"),
                rules: Mutex::new(Vec::new()),
                lines: Mutex::new(Vec::new()),
            }
        }
    }

    impl NetworkGrantSink for RecordingTarget {
        fn allow_access(
            &self,
            from: &NetworkPrincipal,
            to: &NetworkPrincipal,
            port: Port,
        ) -> Result<(), GrantError> {
            self.rules.lock().push((from.clone(), to.clone(), port));
            Ok(())
        }
    }

    impl BootScriptSink for RecordingTarget {
        fn add_download_command(
            &self,
            source: &ArtifactLocation,
        ) -> Result<String, BootScriptError> {
            Ok(format!("/tmp/{}", source.object_key))
        }

        fn add_commands(&self, lines: &[String]) -> Result<(), BootScriptError> {
            self.lines.lock().extend_from_slice(lines);
            Ok(())
        }
    }

    impl MountingInstance for RecordingTarget {
        fn os_type(&self) -> OperatingSystemKind {
            self.os
        }

        fn network_identity(&self) -> &NetworkPrincipal {
            &self.identity
        }

        fn grant_principal(&self) -> &GrantPrincipal {
            &self.role
        }

        fn user_data(&self) -> &dyn BootScriptSink {
            self
        }

        fn network(&self) -> &dyn NetworkGrantSink {
            self
        }
    }

    fn compiler(config: MountableNfsConfig) -> (MountableNfs, Arc<FixedStore>) {
        let store = Arc::new(FixedStore::default());
        let bundles = Arc::new(ScriptBundleRegistry::for_scripts_dir(
            store.clone(),
            "scripts/bash",
        ));
        (
            MountableNfs::new(DeploymentUnitId::new("stack"), bundles, config),
            store,
        )
    }

    fn nfs4() -> MountableNfsConfig {
        MountableNfsConfig::new(NfsVersion::Nfs4, "server.dns", "/export").unwrap()
    }

    #[test]
    fn test_emits_exact_command_sequence() {
        let (nfs, _) = compiler(nfs4());
        let target = RecordingTarget::new(OperatingSystemKind::Linux);

        nfs.mount_to_linux_instance(&target, &LinuxMountPoint::new("/mnt/nfs"))
            .unwrap();

        assert_eq!(
            *target.lines.lock(),
            vec![
                "TMPDIR=$(mktemp -d)",
                "pushd \"$TMPDIR\"",
                "unzip /tmp/abc.zip",
                "bash ./mountNfs.sh nfs4 server.dns '/export' '/mnt/nfs' rw",
                "popd",
                "rm -f /tmp/abc.zip",
            ]
        );
    }

    #[test]
    fn test_service_ports_granted_in_order() {
        let host = NetworkPrincipal::new("sg-nfs");
        let (nfs, _) = compiler(nfs4().with_host_access(host.clone()));
        let target = RecordingTarget::new(OperatingSystemKind::Linux);

        nfs.mount_to_linux_instance(&target, &LinuxMountPoint::new("/mnt/nfs"))
            .unwrap();

        let ports: Vec<Port> = target.rules.lock().iter().map(|r| r.2).collect();
        assert_eq!(
            ports,
            vec![Port::tcp(111), Port::udp(111), Port::tcp(2049), Port::udp(2049)]
        );
        assert!(target
            .rules
            .lock()
            .iter()
            .all(|(from, to, _)| from.as_str() == "sg-client" && to == &host));
    }

    #[test]
    fn test_extra_ports_inert_without_host_access() {
        let (nfs, _) = compiler(nfs4().with_extra_ports([Port::tcp(1234)]));
        let target = RecordingTarget::new(OperatingSystemKind::Linux);

        nfs.mount_to_linux_instance(&target, &LinuxMountPoint::new("/mnt/nfs"))
            .unwrap();

        assert!(target.rules.lock().is_empty());
        assert_eq!(target.lines.lock().len(), 6);
    }

    #[test]
    fn test_read_only_with_extra_options() {
        let (nfs, _) = compiler(nfs4().with_extra_mount_options(["soft", "timeo=14"]));
        let target = RecordingTarget::new(OperatingSystemKind::Linux);
        let mount = LinuxMountPoint::new("/data/").with_permissions(MountPermissions::ReadOnly);

        nfs.mount_to_linux_instance(&target, &mount).unwrap();

        assert_eq!(
            target.lines.lock()[3],
            "bash ./mountNfs.sh nfs4 server.dns '/export' '/data' r,soft,timeo=14"
        );
    }

    #[test]
    fn test_grants_bundle_read_to_target() {
        let (nfs, store) = compiler(nfs4());
        let target = RecordingTarget::new(OperatingSystemKind::Linux);

        nfs.mount_to_linux_instance(&target, &LinuxMountPoint::new("/mnt/nfs"))
            .unwrap();

        assert_eq!(*store.grants.lock(), vec![GrantPrincipal::new("role-client")]);
    }

    #[test]
    fn test_windows_target_rejected_without_side_effects() {
        let (nfs, store) = compiler(nfs4().with_host_access(NetworkPrincipal::new("sg-nfs")));
        let target = RecordingTarget::new(OperatingSystemKind::Windows);

        let err = nfs
            .mount_to_linux_instance(&target, &LinuxMountPoint::new("/mnt/nfs"))
            .unwrap_err();

        assert!(matches!(err, MountError::UnsupportedPlatform));
        assert!(target.rules.lock().is_empty());
        assert!(target.lines.lock().is_empty());
        assert!(store.grants.lock().is_empty());
    }
}

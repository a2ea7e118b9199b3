// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Mounting Instance
//!
//! The view of a virtual machine that mount compilers need: its platform,
//! its network identity, its artifact-read identity and the two sinks that
//! receive the compiled output.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Target descriptor consumed by `MountableLinuxFilesystem`

use crate::domain::artifact::GrantPrincipal;
use crate::domain::boot_script::BootScriptSink;
use crate::domain::network::{NetworkGrantSink, NetworkPrincipal};
use serde::{Deserialize, Serialize};

/// Operating system family of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystemKind {
    Linux,
    Windows,
    Unknown,
}

impl OperatingSystemKind {
    pub fn is_linux(&self) -> bool {
        matches!(self, Self::Linux)
    }
}

impl Default for OperatingSystemKind {
    fn default() -> Self {
        Self::Linux
    }
}

impl std::fmt::Display for OperatingSystemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linux => f.write_str("linux"),
            Self::Windows => f.write_str("windows"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// An instance that a filesystem can be mounted onto
pub trait MountingInstance: Send + Sync {
    /// Platform of the instance
    fn os_type(&self) -> OperatingSystemKind;

    /// The instance's own network principal; source of emitted grants
    fn network_identity(&self) -> &NetworkPrincipal;

    /// Identity used for artifact read grants
    fn grant_principal(&self) -> &GrantPrincipal;

    /// First-boot command sequence of the instance
    fn user_data(&self) -> &dyn BootScriptSink;

    /// Sink receiving firewall rules
    fn network(&self) -> &dyn NetworkGrantSink;
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Compiles "mount this NFS export on that instance at first boot"
//! directives into firewall rules, artifact read grants and boot script
//! commands.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Library root of the provisioner

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;

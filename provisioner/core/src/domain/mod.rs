// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Value objects, capability traits and collaborator contracts for
//! compiling NFS mount directives.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types shared by the application and infrastructure layers

pub mod network;
pub mod artifact;
pub mod boot_script;
pub mod instance;
pub mod mount;
pub mod path_normalizer;
pub mod deployment_config;

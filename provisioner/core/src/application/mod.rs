// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod script_bundle;
pub mod mountable_nfs;
pub mod deployment_planner;

// Re-export services for convenience
pub use deployment_planner::{DeploymentPlan, DeploymentPlanner};
pub use mountable_nfs::MountableNfs;
pub use script_bundle::ScriptBundleRegistry;

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod security_groups;
pub mod user_data;
pub mod artifact_store;
pub mod instance;

pub use artifact_store::InMemoryArtifactStore;
pub use instance::LaunchInstance;
pub use security_groups::SecurityGroupRegistry;
pub use user_data::UserData;

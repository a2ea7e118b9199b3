// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Boot script sink
//!
//! Abstraction over an instance's first-boot command sequence (user data).

use crate::domain::artifact::ArtifactLocation;
use thiserror::Error;

/// Ordered command sequence executed once at first boot of an instance.
pub trait BootScriptSink: Send + Sync {
    /// Schedule a download of the artifact at `source`.
    ///
    /// Returns a token that stands for the local path of the downloaded file
    /// once the script runs. The token is only meaningful inside command
    /// text appended to the same sink.
    fn add_download_command(&self, source: &ArtifactLocation) -> Result<String, BootScriptError>;

    /// Append literal command lines, preserving order
    fn add_commands(&self, lines: &[String]) -> Result<(), BootScriptError>;
}

#[derive(Debug, Error)]
pub enum BootScriptError {
    #[error("Boot script is sealed and no longer accepts commands")]
    Sealed,

    #[error("Command rejected: {0}")]
    Rejected(String),
}

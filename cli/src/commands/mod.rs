// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for nfsboot CLI

pub mod config;
pub mod render;

pub use self::config::ConfigCommand;
pub use self::render::RenderCommand;

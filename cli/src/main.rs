// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # nfsboot CLI
//!
//! The `nfsboot` binary compiles a deployment manifest of NFS mount
//! directives into per-instance user data, ingress rules and the mount
//! helper bundle those instances download at first boot.
//!
//! ## Commands
//!
//! - `nfsboot render [--format text|json] [--output-dir DIR]` - Compile the manifest
//! - `nfsboot config show|validate|generate` - Manifest management
//!
//! Logs go to stderr; rendered output goes to stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use nfsboot::commands::{self, ConfigCommand, RenderCommand};

/// nfsboot - Mount NFS exports on instances at first boot
#[derive(Parser)]
#[command(name = "nfsboot")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to deployment manifest (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "NFSBOOT_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "NFSBOOT_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the manifest into user data and ingress rules
    #[command(name = "render")]
    Render {
        #[command(flatten)]
        command: RenderCommand,
    },

    /// Manifest management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Render { command }) => commands::render::execute(command, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

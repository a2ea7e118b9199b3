// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Manifest management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use nfsboot_core::domain::deployment_config::DeploymentManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved deployment manifest
    Show {
        /// Show manifest file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate a deployment manifest
    Validate {
        /// Path to manifest (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a sample deployment manifest
    Generate {
        /// Output path (default: ./nfsboot.yaml)
        #[arg(short, long, default_value = "./nfsboot.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Manifest discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. NFSBOOT_CONFIG_PATH: {}",
            std::env::var("NFSBOOT_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./nfsboot.yaml");
        println!("  4. ~/.nfsboot/deployment.yaml");
        println!("  5. /etc/nfsboot/deployment.yaml");
        println!();
    }

    let manifest =
        DeploymentManifest::load(config_override).context("Failed to load deployment manifest")?;
    let spec = &manifest.spec;

    println!("{}", "Deployment:".bold());
    println!("  Name: {}", manifest.metadata.name);
    println!("  Asset bucket: {}", spec.assets.bucket);
    println!("  Scripts: {}", spec.assets.source_directory.display());
    println!();

    println!("{}", "NFS Hosts:".bold());
    for host in &spec.hosts {
        println!("  {} ({})", host.name.bold(), host.security_group);
    }
    println!();

    println!("{}", "Instances:".bold());
    for instance in &spec.instances {
        println!(
            "  {} ({}, {}, role {})",
            instance.name.bold(),
            instance.os,
            instance.security_group,
            instance.role
        );
    }
    println!();

    println!("{}", "Mounts:".bold());
    for mount in &spec.mounts {
        println!(
            "  {} → {}:{}:{} ({})",
            mount.instance,
            mount.nfs.host,
            mount.nfs.export_path,
            mount.mount_point.normalized_location(),
            mount.mount_point.permissions.to_linux_mount_option()
        );
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating deployment manifest...");

    let manifest =
        DeploymentManifest::load(config_path).context("Failed to load deployment manifest")?;

    let warnings = manifest
        .validate()
        .context("Manifest validation failed")?;

    for warning in &warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }

    println!("{}", "✓ Manifest is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/deployment-with-examples.yaml")
    } else {
        include_str!("../../templates/deployment-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write manifest to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Manifest generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_templates_are_valid_manifests() {
        for template in [
            include_str!("../../templates/deployment-minimal.yaml"),
            include_str!("../../templates/deployment-with-examples.yaml"),
        ] {
            let manifest =
                nfsboot_core::domain::deployment_config::DeploymentManifest::from_yaml_str(template)
                    .unwrap();
            manifest.validate().unwrap();
        }
    }
}

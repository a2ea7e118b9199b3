// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Render Command
//!
//! Implements `nfsboot render`: compiles every mount directive of the
//! manifest and prints the resulting user data, ingress rules and bundle
//! artifacts.
//!
//! # Architecture
//!
//! - **Layer:** CLI/Presentation
//! - **Purpose:** Human and machine readable deployment plans
//! - **Integration:** CLI → DeploymentPlanner → stdout / output directory
//!
//! # Usage
//!
//! ```bash
//! # Print the plan for ./nfsboot.yaml
//! nfsboot render
//!
//! # Write <instance>.user-data files and plan.json
//! nfsboot render --output-dir ./out
//!
//! # Machine readable plan
//! nfsboot render --format json
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

use nfsboot_core::application::deployment_planner::{DeploymentPlan, DeploymentPlanner};
use nfsboot_core::domain::deployment_config::DeploymentManifest;

#[derive(Args)]
pub struct RenderCommand {
    /// Output format: text or json
    #[arg(long, default_value = "text")]
    format: String,

    /// Write one <instance>.user-data file per instance plus plan.json
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

pub async fn execute(cmd: RenderCommand, config_path: Option<PathBuf>) -> Result<()> {
    let manifest =
        DeploymentManifest::load(config_path).context("Failed to load deployment manifest")?;

    let plan = DeploymentPlanner::new()
        .plan(&manifest)
        .context("Failed to compile deployment")?;

    if let Some(dir) = &cmd.output_dir {
        info!("Writing plan for {} to {:?}", plan.deployment, dir);
        let written = write_plan(&plan, dir)?;
        println!(
            "{}",
            format!("✓ Wrote {} file(s) to {}", written.len(), dir.display()).green()
        );
        return Ok(());
    }

    match cmd.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&plan)?),
        "text" => print_plan(&plan),
        other => anyhow::bail!("Unknown output format '{}'. Use 'text' or 'json'", other),
    }

    Ok(())
}

/// Write user data files and `plan.json` into `dir`, returning the paths written
pub fn write_plan(plan: &DeploymentPlan, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {:?}", dir))?;

    let mut written = Vec::new();
    for instance in &plan.instances {
        let path = dir.join(format!("{}.user-data", instance.name));
        std::fs::write(&path, &instance.user_data)
            .with_context(|| format!("Failed to write {:?}", path))?;
        written.push(path);
    }

    let plan_path = dir.join("plan.json");
    std::fs::write(&plan_path, serde_json::to_string_pretty(plan)?)
        .with_context(|| format!("Failed to write {:?}", plan_path))?;
    written.push(plan_path);

    Ok(written)
}

fn print_plan(plan: &DeploymentPlan) {
    println!("{} {}", "Deployment:".bold(), plan.deployment);
    println!();

    for warning in &plan.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }
    if !plan.warnings.is_empty() {
        println!();
    }

    for instance in &plan.instances {
        println!("{} ({})", instance.name.bold(), instance.os);
        for line in instance.user_data.lines() {
            println!("  {}", line);
        }
        println!();
    }

    println!("{}", "Ingress rules:".bold());
    if plan.ingress_rules.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for rule in &plan.ingress_rules {
        println!("  {}", rule);
    }
    println!();

    println!("{}", "Artifacts:".bold());
    if plan.artifacts.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for planned in &plan.artifacts {
        println!("  {} → {}", planned.artifact.id, planned.artifact.location.to_uri());
        let readers: Vec<String> = planned.readers.iter().map(ToString::to_string).collect();
        println!("    Readers: {}", readers.join(", "));
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use capbind_core::domain::binding::ComplianceTier;
use capbind_core::domain::engine_config::EngineConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./capbind-config.yaml)
        #[arg(short, long, default_value = "./capbind-config.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output } => generate(output).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let (config, source) = EngineConfigManifest::load_with_source(config_override)
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        for (index, path) in EngineConfigManifest::discovery_paths().iter().enumerate() {
            let marker = if source.path() == Some(path.as_path()) {
                " (loaded)".green().to_string()
            } else if path.exists() {
                String::new()
            } else {
                " (missing)".dimmed().to_string()
            };
            println!("  {}. {}{}", index + 1, path.display(), marker);
        }
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Source: {}", source);
    for (name, value) in active_overrides() {
        println!("  Override: {}={}", name, value);
    }
    println!();

    println!("{}", "Synthesis defaults:".bold());
    println!("  Environment: {}", config.spec.synthesis.environment);
    println!("  Compliance tier: {}", config.spec.synthesis.compliance_tier);
    println!();

    let compliance = &config.spec.compliance;
    println!("{}", "Compliance thresholds:".bold());
    for tier in ComplianceTier::ALL {
        println!(
            "  {:<9} log retention {} days, {} alarms, {}% trace sampling",
            tier.to_string(),
            compliance.log_retention_days.get(tier),
            compliance.alarm_count.get(tier),
            compliance.trace_sampling_percent.get(tier)
        );
    }
    println!(
        "  Admin tolerated in: {}",
        compliance.admin_allowed_environments.join(", ")
    );
    println!();

    let observability = &config.spec.observability;
    println!("{}", "Observability:".bold());
    if observability.inject {
        println!("  Provider: {} ({})", observability.provider_component, observability.capability);
        println!("  Collector: {}", observability.collector_endpoint);
        println!("  Log destination: {}", observability.log_destination);
    } else {
        println!("  {}", "(injection disabled)".dimmed());
    }
    println!();

    println!("{}", "Logging:".bold());
    println!("  Level: {}", config.spec.logging.level);
    println!("  Format: {}", config.spec.logging.format);

    Ok(())
}

/// `CAPBIND_*` override variables set in the current process.
fn active_overrides() -> Vec<(&'static str, String)> {
    ["CAPBIND_ENVIRONMENT", "CAPBIND_COMPLIANCE_TIER"]
        .into_iter()
        .filter_map(|name| std::env::var(name).ok().map(|value| (name, value)))
        .collect()
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let (config, source) = EngineConfigManifest::load_with_source(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .with_context(|| format!("Configuration from {} is invalid", source))?;

    println!("{}", format!("✓ Configuration is valid ({})", source).green());

    Ok(())
}

async fn generate(output: PathBuf) -> Result<()> {
    let sample = include_str!("../../templates/config-minimal.yaml");

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # capbind
//!
//! Command-line driver for the capability binding engine.
//!
//! ## Commands
//!
//! - `capbind synth <MANIFEST>` - Resolve every binding in a service manifest
//! - `capbind strategies` - List the strategy table in resolution order
//! - `capbind config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use capbind_cli::commands::{self, ConfigCommand, SynthArgs};
use capbind_core::domain::engine_config::EngineConfigManifest;

/// capbind - resolve capability bindings between platform components
#[derive(Parser)]
#[command(name = "capbind")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "CAPBIND_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); falls back to the configuration file
    #[arg(long, global = true, env = "CAPBIND_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesise bindings for a service manifest
    #[command(name = "synth")]
    Synth(SynthArgs),

    /// List registered binder strategies
    #[command(name = "strategies")]
    Strategies,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging settings come from the config file unless overridden. A broken file is
    // reported by the command itself, so fall back to defaults here.
    let logging = EngineConfigManifest::load_or_default(cli.config.clone())
        .map(|config| config.spec.logging)
        .unwrap_or_default();
    let level = cli.log_level.clone().unwrap_or(logging.level);
    init_logging(&level, &logging.format)?;

    match cli.command {
        Some(Commands::Synth(args)) => {
            let success = commands::synth::handle_command(args, cli.config).await?;
            if !success {
                std::process::exit(2);
            }
            Ok(())
        }
        Some(Commands::Strategies) => commands::strategies::handle_command().await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}

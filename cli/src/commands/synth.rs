// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `capbind synth` - run binding synthesis over a service manifest

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use capbind_core::application::{SynthesisDriver, SynthesisFailure, SynthesisReport};
use capbind_core::domain::binding::ComplianceTier;
use capbind_core::domain::engine_config::EngineConfigManifest;
use capbind_core::infrastructure::manifest_parser::ServiceManifestParser;
use capbind_core::infrastructure::metrics::AuditMetricsCollector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct SynthArgs {
    /// Path to service manifest YAML file
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Compliance tier (overrides manifest and configuration)
    #[arg(long, value_name = "TIER", value_parser = parse_tier)]
    pub tier: Option<ComplianceTier>,

    /// Environment name (overrides manifest and configuration)
    #[arg(long = "env", value_name = "ENV")]
    pub environment: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Resolve bindings on the blocking thread pool
    #[arg(long)]
    pub concurrent: bool,
}

fn parse_tier(value: &str) -> Result<ComplianceTier, String> {
    value.parse()
}

/// Runs synthesis and prints the report. Returns `false` when any binding failed.
pub async fn handle_command(args: SynthArgs, config_path: Option<PathBuf>) -> Result<bool> {
    let config = EngineConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let manifest = ServiceManifestParser::parse_file(&args.manifest)?;

    let mut driver = SynthesisDriver::from_config(&config, Arc::new(AuditMetricsCollector::new()));
    let mut options = driver.options().clone();
    if let Some(environment) = args.environment {
        options = options.with_environment(environment);
    }
    if let Some(tier) = args.tier {
        options = options.with_tier(tier);
    }
    driver = driver.with_options(options);

    let report = if args.concurrent {
        driver.synthesize_concurrently(&manifest).await
    } else {
        driver.synthesize(&manifest)
    }
    .with_context(|| format!("Synthesis failed for {:?}", args.manifest))?;

    info!(
        run_id = %report.run_id,
        resolved = report.bindings.len(),
        failed = report.failures().len(),
        "Synthesis finished"
    );

    match args.format {
        OutputFormat::Json => println!("{}", report.to_json().context("Failed to serialize report")?),
        OutputFormat::Text => print!("{}", render_text(&report)?),
    }

    Ok(report.is_success())
}

/// Human-readable report.
pub fn render_text(report: &SynthesisReport) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, report)?;
    Ok(out)
}

fn write_report(out: &mut String, report: &SynthesisReport) -> std::fmt::Result {
    writeln!(out, "{}", format!("Synthesis: {}", report.manifest).bold())?;
    writeln!(out, "  Run: {}", report.run_id)?;
    writeln!(out, "  Environment: {}", report.environment)?;
    writeln!(out, "  Compliance tier: {}", report.compliance_tier)?;
    writeln!(
        out,
        "  Bindings: {} planned, {} resolved, {} failed",
        report.planned,
        report.bindings.len(),
        report.failures().len()
    )?;
    writeln!(out)?;

    if !report.bindings.is_empty() {
        writeln!(out, "{}", "Bindings:".bold())?;
        for record in &report.bindings {
            let marker = if record.injected { " (injected)" } else { "" };
            writeln!(
                out,
                "  {} {} {}{}",
                "✓".green(),
                record.subject,
                record.access,
                marker.dimmed()
            )?;
            for (name, value) in &record.result.environment_variables {
                writeln!(out, "      {}={}", name, value)?;
            }
            for statement in &record.result.access_statements {
                writeln!(
                    out,
                    "      allow {} on {}",
                    statement.actions.join(","),
                    statement.resources.join(",")
                )?;
            }
            for action in &record.result.compliance_actions {
                writeln!(out, "      compliance: {}", action)?;
            }
        }
        writeln!(out)?;
    }

    if !report.failures().is_empty() {
        writeln!(out, "{}", "Failures:".bold())?;
        for failure in report.failures() {
            write_failure(out, failure)?;
        }
        writeln!(out)?;
    }

    let metrics = &report.metrics;
    writeln!(out, "{}", "Metrics:".bold())?;
    writeln!(
        out,
        "  cache hits {} / misses {} ({:.0}% hit ratio)",
        metrics.cache_hits,
        metrics.cache_misses,
        metrics.hit_ratio() * 100.0
    )?;
    writeln!(
        out,
        "  successes {}, violations {}, errors {}",
        metrics.successes, metrics.violations, metrics.errors
    )?;

    Ok(())
}

fn write_failure(out: &mut String, failure: &SynthesisFailure) -> std::fmt::Result {
    writeln!(out, "  {} {}: {}", "✗".red(), failure.class().red(), failure.subject())?;
    match failure.violations() {
        [] => writeln!(out, "      {}", failure)?,
        violations => {
            for violation in violations {
                writeln!(out, "      - {}: {}", violation.rule_id.yellow(), violation.message)?;
                writeln!(out, "        remediation: {}", violation.remediation)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use capbind_core::application::SynthesisOptions;
    use clap::Parser;

    const MANIFEST: &str = r#"
apiVersion: capbind.dev/v1
kind: ServiceManifest
metadata:
  name: ledger
spec:
  environment: prod
  compliance_tier: baseline
  components:
    - id: api
      type: compute-function
      bindings:
        - target: ledger-db
          capability: db:postgres
          access: admin
        - target: sessions
          capability: cache:redis
          access: read
    - id: ledger-db
      type: database
      provides:
        - capability: db:postgres
          attributes:
            host: ledger.internal
            port: 5432
            resourceArn: "arn:aws:rds-db:eu-west-1:1:dbuser:ledger/app"
    - id: sessions
      type: cache
      provides:
        - capability: cache:redis
          attributes:
            host: sessions.internal
            port: 6379
"#;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: SynthArgs,
    }

    fn report() -> SynthesisReport {
        let manifest = ServiceManifestParser::parse_yaml(MANIFEST).unwrap();
        SynthesisDriver::from_config(&EngineConfigManifest::default(), Arc::new(AuditMetricsCollector::new()))
            .with_options(SynthesisOptions::default().without_observability())
            .synthesize(&manifest)
            .unwrap()
    }

    #[test]
    fn test_parse_args() {
        let cli = TestCli::try_parse_from([
            "synth",
            "service.yaml",
            "--tier",
            "strict",
            "--env",
            "staging",
            "--format",
            "json",
            "--concurrent",
        ])
        .unwrap();
        assert_eq!(cli.args.manifest, PathBuf::from("service.yaml"));
        assert_eq!(cli.args.tier, Some(ComplianceTier::Strict));
        assert_eq!(cli.args.environment.as_deref(), Some("staging"));
        assert_eq!(cli.args.format, OutputFormat::Json);
        assert!(cli.args.concurrent);

        assert!(TestCli::try_parse_from(["synth", "service.yaml", "--tier", "extreme"]).is_err());
    }

    #[test]
    fn test_render_text_lists_failures_with_remediation() {
        colored::control::set_override(false);
        let text = render_text(&report()).unwrap();

        assert!(text.contains("Synthesis: ledger"));
        assert!(text.contains("1 resolved, 1 failed"));
        assert!(text.contains("SESSIONS_URL=redis://sessions.internal:6379"));
        assert!(text.contains("ComplianceViolation: api -> ledger-db [db:postgres, baseline]"));
        assert!(text.contains("BASE-ADMIN-DATASTORE"));
        assert!(text.contains("remediation:"));
    }

    #[tokio::test]
    async fn test_handle_command_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("service.yaml");
        std::fs::write(&manifest, MANIFEST).unwrap();
        let config = dir.path().join("capbind-config.yaml");
        EngineConfigManifest::default().to_yaml_file(&config).unwrap();

        let args = SynthArgs {
            manifest: manifest.clone(),
            tier: None,
            environment: None,
            format: OutputFormat::Json,
            concurrent: false,
        };
        assert!(!handle_command(args, Some(config.clone())).await.unwrap());

        let args = SynthArgs {
            manifest,
            tier: None,
            environment: Some("dev".to_string()),
            format: OutputFormat::Json,
            concurrent: true,
        };
        assert!(handle_command(args, Some(config)).await.unwrap());
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Any source → telemetry pipeline.
//!
//! The wiring depends on the context's compliance tier:
//!
//! | Tier | Logs | Traces | Metrics |
//! |------|------|--------|---------|
//! | baseline | exported | off | off |
//! | elevated | exported | exported, ratio sampled | off |
//! | strict | exported | exported, ratio sampled | exported |
//!
//! Retention periods, alarm counts and sampling ratios come from compliance rules,
//! not from here.

use crate::domain::binding::{AccessStatement, BindingContext, BindingResult, ComplianceTier, NetworkRule};
use crate::domain::capability::CapabilityKind;
use crate::domain::matcher::{CapabilityMatcher, PairMatcher, SourceMatcher};
use crate::domain::strategy::{BinderStrategy, StrategyError};

use super::{optional_port, optional_str, require_str};

const DEFAULT_OTLP_PORT: u16 = 4317;

pub struct ObservabilityStrategy;

/// Port from `scheme://host:port[/path]`, if present.
fn endpoint_port(endpoint: &str) -> Option<u16> {
    let authority = endpoint.split("://").nth(1).unwrap_or(endpoint);
    let authority = authority.split('/').next().unwrap_or(authority);
    authority.rsplit_once(':').and_then(|(_, port)| port.parse().ok())
}

impl BinderStrategy for ObservabilityStrategy {
    fn name(&self) -> &str {
        "observability"
    }

    fn matcher(&self) -> PairMatcher {
        PairMatcher::new(SourceMatcher::Any, CapabilityMatcher::Kind(CapabilityKind::Observability))
    }

    fn bind(&self, context: &BindingContext) -> Result<BindingResult, StrategyError> {
        // Telemetry only flows out of the source.
        if !context.access().can_write() {
            return Err(StrategyError::UnsupportedAccess {
                capability: context.capability_id().clone(),
                access: context.access(),
            });
        }

        let endpoint = require_str(context, "collectorEndpoint")?;
        let port = match optional_port(context, "collectorPort")? {
            Some(port) => port,
            None => endpoint_port(endpoint).unwrap_or(DEFAULT_OTLP_PORT),
        };
        let tier = context.compliance_tier();
        let source = context.source_component_id();
        let target = context.target_component_id();
        let exporter = |enabled: bool| if enabled { "otlp" } else { "none" };

        let mut result = BindingResult::new()
            .with_env("OTEL_EXPORTER_OTLP_ENDPOINT", endpoint)
            .with_env("OTEL_SERVICE_NAME", source.as_str())
            .with_env(
                "OTEL_RESOURCE_ATTRIBUTES",
                format!(
                    "deployment.environment={},compliance.tier={}",
                    context.environment(),
                    tier
                ),
            )
            .with_env("OTEL_LOGS_EXPORTER", "otlp")
            .with_env("OTEL_TRACES_EXPORTER", exporter(tier >= ComplianceTier::Elevated))
            .with_env("OTEL_METRICS_EXPORTER", exporter(tier >= ComplianceTier::Strict))
            .with_network_rule(NetworkRule::tcp_ingress(source.clone(), port, format!("telemetry from {}", source)))
            .with_network_rule(NetworkRule::tcp_egress(target.clone(), port, format!("telemetry to {}", target)));

        if let Some(destination) = optional_str(context, "logDestination")? {
            result = result.with_statement(AccessStatement::allow(
                ["logs:CreateLogStream", "logs:PutLogEvents"],
                [format!("log-group:{}/{}:*", destination.trim_end_matches('/'), source)],
            ));
        }
        if tier >= ComplianceTier::Elevated {
            result = result
                .with_env("OTEL_TRACES_SAMPLER", "parentbased_traceidratio")
                .with_statement(AccessStatement::allow(
                    ["xray:PutTraceSegments", "xray:PutTelemetryRecords"],
                    ["*"],
                ));
        }
        if tier >= ComplianceTier::Strict {
            result = result.with_statement(AccessStatement::allow(["cloudwatch:PutMetricData"], ["*"]));
        }
        Ok(result)
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Manifest Synthesis Driver
//!
//! Caller of the [`BinderRegistry`]. For one [`ServiceManifest`] the driver:
//!
//! 1. validates the manifest and resolves the run's environment and tier
//!    (CLI override, then manifest, then configured default);
//! 2. registers every provided capability in a fresh [`CapabilityDirectory`], plus the
//!    platform telemetry capability when observability injection is on;
//! 3. plans one [`PlannedBinding`] per declared binding and, for each compute
//!    component without an explicit telemetry binding, one injected observability
//!    directive;
//! 4. resolves every planned binding, sequentially or on the blocking pool, and
//!    folds the results into a [`SynthesisReport`] in plan order.
//!
//! A failed binding never stops the run. Every failure is reported, whichever class
//! it belongs to.
//!
//! The registry's cache is cleared at the start of each run.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::binding::{
    Attachment, BindingContext, BindingDirective, BindingResult, BindingSubject, ComplianceTier,
};
use crate::domain::capability::{CapabilityDirectory, CapabilityKind, DirectoryError};
use crate::domain::component::{ComponentId, SourceType};
use crate::domain::engine_config::{EngineConfigManifest, ObservabilityConfig, SynthesisDefaults};
use crate::domain::manifest::{ManifestError, ServiceManifest};
use crate::infrastructure::metrics::{MetricsCollector, MetricsSummary};

use super::registry::BinderRegistry;
use super::report::{BindingRecord, ComponentAttachments, SynthesisFailure, SynthesisReport};

/// Errors that prevent a run from starting or completing at all. Individual binding
/// failures are not errors here; they land in the report.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("invalid manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("capability registration failed: {0}")]
    Directory(#[from] DirectoryError),

    #[error("binding worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Default)]
pub struct SynthesisOptions {
    pub defaults: SynthesisDefaults,
    pub observability: ObservabilityConfig,
    /// Wins over both the manifest and the defaults
    pub environment_override: Option<String>,
    /// Wins over both the manifest and the defaults
    pub tier_override: Option<ComplianceTier>,
}

impl SynthesisOptions {
    pub fn from_config(config: &EngineConfigManifest) -> Self {
        Self {
            defaults: config.spec.synthesis.clone(),
            observability: config.spec.observability.clone(),
            environment_override: None,
            tier_override: None,
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment_override = Some(environment.into());
        self
    }

    pub fn with_tier(mut self, tier: ComplianceTier) -> Self {
        self.tier_override = Some(tier);
        self
    }

    pub fn without_observability(mut self) -> Self {
        self.observability.inject = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBinding {
    pub source: ComponentId,
    pub source_type: SourceType,
    pub target: ComponentId,
    pub directive: BindingDirective,
    pub injected: bool,
}

/// Everything needed to resolve a manifest's bindings. Read-only once built.
#[derive(Debug, Clone)]
pub struct SynthesisPlan {
    pub manifest: String,
    pub environment: String,
    pub compliance_tier: ComplianceTier,
    pub directory: CapabilityDirectory,
    pub bindings: Vec<PlannedBinding>,
}

impl SynthesisPlan {
    pub fn subject(&self, planned: &PlannedBinding) -> BindingSubject {
        BindingSubject {
            source_component_id: planned.source.clone(),
            target_component_id: planned.target.clone(),
            capability_id: planned.directive.capability.clone(),
            compliance_tier: self.compliance_tier,
        }
    }

    /// Builds the engine request for `planned` from the directory.
    pub fn context(&self, planned: &PlannedBinding) -> Result<BindingContext, SynthesisFailure> {
        if planned.source == planned.target {
            return Err(SynthesisFailure::SelfBinding {
                subject: self.subject(planned),
            });
        }

        let payload = self
            .directory
            .resolve(&planned.target, &planned.directive.capability)
            .map_err(|source| SynthesisFailure::UnresolvedTarget {
                subject: self.subject(planned),
                source,
            })?;

        Ok(BindingContext::new(
            planned.source.clone(),
            planned.source_type.clone(),
            planned.target.clone(),
            payload.clone(),
            planned.directive.clone(),
            self.environment.clone(),
            self.compliance_tier,
        ))
    }
}

struct RunStart {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    events_offset: usize,
}

pub struct SynthesisDriver {
    registry: Arc<BinderRegistry>,
    options: SynthesisOptions,
}

impl SynthesisDriver {
    pub fn new(registry: Arc<BinderRegistry>, options: SynthesisOptions) -> Self {
        Self { registry, options }
    }

    /// Standard strategies and rules, with thresholds and defaults taken from `config`.
    pub fn from_config(config: &EngineConfigManifest, metrics: Arc<dyn MetricsCollector>) -> Self {
        let registry = BinderRegistry::standard(config.spec.compliance.clone(), metrics);
        Self::new(Arc::new(registry), SynthesisOptions::from_config(config))
    }

    pub fn with_options(mut self, options: SynthesisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<BinderRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    pub fn plan(&self, manifest: &ServiceManifest) -> Result<SynthesisPlan, SynthesisError> {
        manifest.validate()?;

        let environment = self
            .options
            .environment_override
            .clone()
            .or_else(|| manifest.spec.environment.clone())
            .unwrap_or_else(|| self.options.defaults.environment.clone());
        let compliance_tier = self
            .options
            .tier_override
            .or(manifest.spec.compliance_tier)
            .unwrap_or(self.options.defaults.compliance_tier);

        let mut directory = CapabilityDirectory::new();
        for component in &manifest.spec.components {
            for provided in &component.provides {
                directory.register(component.id.clone(), provided.to_payload())?;
            }
        }

        let observability = &self.options.observability;
        if observability.inject
            && directory
                .resolve(&observability.provider_component, &observability.capability)
                .is_err()
        {
            directory.register(observability.provider_component.clone(), observability.payload())?;
        }

        let mut bindings = Vec::with_capacity(manifest.binding_count());
        for component in &manifest.spec.components {
            for binding in &component.bindings {
                bindings.push(PlannedBinding {
                    source: component.id.clone(),
                    source_type: component.component_type.clone(),
                    target: binding.target.clone(),
                    directive: binding.directive(),
                    injected: false,
                });
            }

            let wants_telemetry = observability.inject
                && component.component_type.is_compute()
                && component.id != observability.provider_component
                && !component
                    .bindings
                    .iter()
                    .any(|b| b.capability.kind() == CapabilityKind::Observability);
            if wants_telemetry {
                bindings.push(PlannedBinding {
                    source: component.id.clone(),
                    source_type: component.component_type.clone(),
                    target: observability.provider_component.clone(),
                    directive: BindingDirective::new(observability.capability.clone(), observability.access()),
                    injected: true,
                });
            }
        }

        Ok(SynthesisPlan {
            manifest: manifest.metadata.name.clone(),
            environment,
            compliance_tier,
            directory,
            bindings,
        })
    }

    /// Resolves every binding on the calling thread.
    pub fn synthesize(&self, manifest: &ServiceManifest) -> Result<SynthesisReport, SynthesisError> {
        let plan = self.plan(manifest)?;
        let run = self.begin(&plan);
        let outcomes = plan
            .bindings
            .iter()
            .map(|planned| resolve_planned(&self.registry, &plan, planned))
            .collect();
        Ok(self.finish(run, &plan, outcomes))
    }

    /// Resolves every binding on tokio's blocking pool. The report lists bindings in
    /// plan order, as [`Self::synthesize`] does.
    pub async fn synthesize_concurrently(&self, manifest: &ServiceManifest) -> Result<SynthesisReport, SynthesisError> {
        let plan = Arc::new(self.plan(manifest)?);
        let run = self.begin(&plan);

        let handles: Vec<_> = (0..plan.bindings.len())
            .map(|index| {
                let registry = Arc::clone(&self.registry);
                let plan = Arc::clone(&plan);
                tokio::task::spawn_blocking(move || resolve_planned(&registry, &plan, &plan.bindings[index]))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(handle.await?);
        }
        Ok(self.finish(run, &plan, outcomes))
    }

    fn begin(&self, plan: &SynthesisPlan) -> RunStart {
        self.registry.reset();
        let run = RunStart {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            events_offset: self.registry.metrics().events().len(),
        };
        info!(
            run_id = %run.run_id,
            manifest = %plan.manifest,
            environment = %plan.environment,
            tier = %plan.compliance_tier,
            bindings = plan.bindings.len(),
            "Starting synthesis"
        );
        run
    }

    fn finish(
        &self,
        run: RunStart,
        plan: &SynthesisPlan,
        outcomes: Vec<Result<Arc<BindingResult>, SynthesisFailure>>,
    ) -> SynthesisReport {
        let mut bindings = Vec::new();
        let mut failures = Vec::new();
        let mut attachments: BTreeMap<ComponentId, ComponentAttachments> = BTreeMap::new();

        for (planned, outcome) in plan.bindings.iter().zip(outcomes) {
            match outcome {
                Ok(result) => {
                    attachments
                        .entry(planned.source.clone())
                        .or_default()
                        .absorb(&planned.source, Attachment::Source, &result);
                    attachments
                        .entry(planned.target.clone())
                        .or_default()
                        .absorb(&planned.target, Attachment::Target, &result);

                    let fingerprint = result.fingerprint().unwrap_or_else(|e| {
                        warn!(subject = %plan.subject(planned), "Failed to fingerprint binding result: {}", e);
                        String::new()
                    });
                    bindings.push(BindingRecord {
                        subject: plan.subject(planned),
                        access: planned.directive.access,
                        injected: planned.injected,
                        fingerprint,
                        result: BindingResult::clone(&result),
                    });
                }
                Err(failure) => failures.push(failure),
            }
        }
        attachments.retain(|_, attached| !attached.is_empty());

        let events = self.registry.metrics().events();
        let metrics = MetricsSummary::from_events(events.get(run.events_offset..).unwrap_or(&[]));

        if failures.is_empty() {
            info!(run_id = %run.run_id, bindings = bindings.len(), "Synthesis completed");
        } else {
            warn!(
                run_id = %run.run_id,
                succeeded = bindings.len(),
                failed = failures.len(),
                "Synthesis completed with failures"
            );
        }

        SynthesisReport {
            run_id: run.run_id,
            manifest: plan.manifest.clone(),
            environment: plan.environment.clone(),
            compliance_tier: plan.compliance_tier,
            started_at: run.started_at,
            finished_at: Utc::now(),
            planned: plan.bindings.len(),
            bindings,
            attachments,
            failures,
            metrics,
        }
    }
}

fn resolve_planned(
    registry: &BinderRegistry,
    plan: &SynthesisPlan,
    planned: &PlannedBinding,
) -> Result<Arc<BindingResult>, SynthesisFailure> {
    let context = plan.context(planned).inspect_err(|failure| {
        warn!("{}", failure);
    })?;
    Ok(registry.bind(&context)?)
}

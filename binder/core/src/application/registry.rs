// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Binder Registry
//!
//! Root of the binding engine. [`BinderRegistry::bind`] runs one request through:
//!
//! 1. cache lookup by [`BindingContextKey`](crate::domain::binding::BindingContextKey);
//!    a hit returns the stored `Arc` unchanged;
//! 2. strategy lookup in the [`StrategyTable`] (`StrategyNotFound` if none);
//! 3. compliance enforcement (`ComplianceViolation` with every violation);
//! 4. strategy execution (`ExecutionFailed` with the context preserved);
//! 5. mandatory actions prepended to the strategy's own, then cached.
//!
//! Nothing is retried. The only side effects are the cache write and the events
//! sent to the [`MetricsCollector`].

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::domain::binding::{BindingContext, BindingResult, BindingSubject};
use crate::domain::compliance::ComplianceSettings;
use crate::domain::error::BindingError;
use crate::domain::events::{BindingEvent, BindingOutcome};
use crate::domain::strategy::StrategyTable;
use crate::infrastructure::cache::BindingCache;
use crate::infrastructure::metrics::MetricsCollector;
use crate::infrastructure::strategies::default_strategy_table;

use super::compliance_enforcer::ComplianceEnforcer;

pub struct BinderRegistry {
    strategies: StrategyTable,
    enforcer: ComplianceEnforcer,
    cache: BindingCache,
    metrics: Arc<dyn MetricsCollector>,
}

impl BinderRegistry {
    pub fn new(
        strategies: StrategyTable,
        enforcer: ComplianceEnforcer,
        cache: BindingCache,
        metrics: Arc<dyn MetricsCollector>,
    ) -> Self {
        Self {
            strategies,
            enforcer,
            cache,
            metrics,
        }
    }

    /// Built-in strategies and rules over an empty cache.
    pub fn standard(settings: ComplianceSettings, metrics: Arc<dyn MetricsCollector>) -> Self {
        Self::new(
            default_strategy_table(),
            ComplianceEnforcer::standard(settings),
            BindingCache::new(),
            metrics,
        )
    }

    pub fn bind(&self, context: &BindingContext) -> Result<Arc<BindingResult>, BindingError> {
        let started = Instant::now();
        let key = context.key();
        let subject = context.subject();

        if let Some(cached) = self.cache.get(&key) {
            debug!(subject = %subject, "Binding cache hit");
            self.record(subject, BindingOutcome::CacheHit, started.elapsed());
            return Ok(cached);
        }
        self.record(subject.clone(), BindingOutcome::CacheMiss, started.elapsed());

        match self.resolve(context, &subject) {
            Ok(result) => {
                let stored = self.cache.set(key, Arc::new(result));
                self.record(subject, BindingOutcome::Success, started.elapsed());
                Ok(stored)
            }
            Err(error) => {
                let outcome = match &error {
                    BindingError::ComplianceViolation { violations, .. } => BindingOutcome::Violation {
                        count: violations.len(),
                    },
                    other => BindingOutcome::Error { kind: other.kind() },
                };
                self.record(subject, outcome, started.elapsed());
                Err(error)
            }
        }
    }

    fn resolve(&self, context: &BindingContext, subject: &BindingSubject) -> Result<BindingResult, BindingError> {
        let strategy = self
            .strategies
            .resolve(context.source_type(), context.capability_id())
            .ok_or_else(|| BindingError::StrategyNotFound {
                subject: subject.clone(),
                source_type: context.source_type().clone(),
                capability: context.capability_id().clone(),
            })?;

        let enforcement = self.enforcer.enforce(context);
        if !enforcement.is_approved() {
            return Err(BindingError::ComplianceViolation {
                subject: subject.clone(),
                violations: enforcement.violations,
            });
        }

        debug!(subject = %subject, strategy = strategy.name(), "Executing binding strategy");
        let result = strategy
            .bind(context)
            .map_err(|source| BindingError::ExecutionFailed {
                subject: subject.clone(),
                strategy: strategy.name().to_string(),
                context: Box::new(context.clone()),
                source,
            })?;

        Ok(result.with_mandatory_actions(enforcement.actions))
    }

    fn record(&self, subject: BindingSubject, outcome: BindingOutcome, duration: Duration) {
        self.metrics.record(BindingEvent::new(subject, outcome, duration));
    }

    /// Discards every cached result. Call between independent synthesis runs.
    pub fn reset(&self) {
        self.cache.clear();
    }

    pub fn cache(&self) -> &BindingCache {
        &self.cache
    }

    pub fn strategies(&self) -> &StrategyTable {
        &self.strategies
    }

    pub fn enforcer(&self) -> &ComplianceEnforcer {
        &self.enforcer
    }

    pub fn metrics(&self) -> &Arc<dyn MetricsCollector> {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::binding::{AccessMode, BindingDirective, ComplianceAction, ComplianceTier};
    use crate::domain::capability::{CapabilityKind, CapabilityPayload};
    use crate::domain::component::{ComponentId, SourceGroup, SourceType};
    use crate::domain::matcher::{CapabilityMatcher, PairMatcher, SourceMatcher};
    use crate::domain::strategy::{BinderStrategy, StrategyError};
    use crate::infrastructure::metrics::AuditMetricsCollector;

    struct QueueEcho;

    impl BinderStrategy for QueueEcho {
        fn name(&self) -> &str {
            "queue-echo"
        }

        fn matcher(&self) -> PairMatcher {
            PairMatcher::new(
                SourceMatcher::Group(SourceGroup::Compute),
                CapabilityMatcher::Kind(CapabilityKind::Queue),
            )
        }

        fn bind(&self, context: &BindingContext) -> Result<BindingResult, StrategyError> {
            Ok(BindingResult::new()
                .with_env("QUEUE", context.target_component_id().as_str())
                .with_action(ComplianceAction::Alarms { count: 1 }))
        }
    }

    fn registry(metrics: Arc<AuditMetricsCollector>) -> BinderRegistry {
        BinderRegistry::new(
            StrategyTable::new().with(Arc::new(QueueEcho)),
            ComplianceEnforcer::standard(ComplianceSettings::default()),
            BindingCache::new(),
            metrics,
        )
    }

    fn context(tier: ComplianceTier) -> BindingContext {
        BindingContext::new(
            ComponentId::new("worker"),
            SourceType::Worker,
            ComponentId::new("jobs"),
            CapabilityPayload::new("queue:sqs"),
            BindingDirective::new("queue:sqs", AccessMode::Read),
            "prod",
            tier,
        )
    }

    #[test]
    fn test_second_bind_is_cached() {
        let metrics = Arc::new(AuditMetricsCollector::new());
        let registry = registry(metrics.clone());

        let first = registry.bind(&context(ComplianceTier::Baseline)).unwrap();
        let second = registry.bind(&context(ComplianceTier::Baseline)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let labels: Vec<&str> = metrics.events().iter().map(|e| e.outcome.label()).collect();
        assert_eq!(labels, vec!["miss", "success", "hit"]);
    }

    #[test]
    fn test_tiers_do_not_share_entries() {
        let registry = registry(Arc::new(AuditMetricsCollector::new()));
        let baseline = registry.bind(&context(ComplianceTier::Baseline)).unwrap();
        let elevated = registry.bind(&context(ComplianceTier::Elevated)).unwrap();

        assert!(!Arc::ptr_eq(&baseline, &elevated));
        assert_eq!(registry.cache().len(), 2);
    }

    #[test]
    fn test_mandatory_actions_precede_strategy_actions() {
        let registry = registry(Arc::new(AuditMetricsCollector::new()));
        let result = registry.bind(&context(ComplianceTier::Elevated)).unwrap();

        assert_eq!(
            result.compliance_actions,
            vec![
                ComplianceAction::EncryptionAtRest,
                ComplianceAction::LogRetention { days: 90 },
                ComplianceAction::Alarms { count: 2 },
                ComplianceAction::Alarms { count: 1 },
            ]
        );
    }

    #[test]
    fn test_errors_are_recorded() {
        let metrics = Arc::new(AuditMetricsCollector::new());
        let registry = registry(metrics.clone());
        let unknown = BindingContext::new(
            ComponentId::new("worker"),
            SourceType::Worker,
            ComponentId::new("sessions"),
            CapabilityPayload::new("cache:redis"),
            BindingDirective::new("cache:redis", AccessMode::Read),
            "prod",
            ComplianceTier::Baseline,
        );

        let error = registry.bind(&unknown).unwrap_err();
        assert!(matches!(error, BindingError::StrategyNotFound { .. }));
        assert_eq!(metrics.events().last().map(|e| e.outcome.label()), Some("error"));
        assert!(registry.cache().is_empty());
    }

    #[test]
    fn test_reset_clears_cache() {
        let registry = registry(Arc::new(AuditMetricsCollector::new()));
        registry.bind(&context(ComplianceTier::Strict)).unwrap();
        assert_eq!(registry.cache().len(), 1);
        registry.reset();
        assert!(registry.cache().is_empty());
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Binding Metrics and Audit Stream
//!
//! Records one [`BindingEvent`] per step of every binding attempt (cache hit or miss,
//! then success, violation or error). Collectors are pure observers: the registry
//! never reads them back, so tests can swap in any fake.
//!
//! [`AuditMetricsCollector`] keeps the append-only stream in memory for the
//! post-synthesis report and mirrors each event to:
//!
//! - `tracing`, at `debug` for hits/misses/successes, `warn` for violations and
//!   `error` for failures;
//! - the `metrics` facade: `capbind_binding_attempts_total{outcome,tier}` and
//!   `capbind_binding_duration_seconds{tier}`. Without an installed recorder these
//!   are no-ops.

use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::domain::binding::ComplianceTier;
use crate::domain::events::{BindingEvent, BindingOutcome};

pub trait MetricsCollector: Send + Sync {
    fn record(&self, event: BindingEvent);

    /// Snapshot of everything recorded so far, in recording order.
    fn events(&self) -> Vec<BindingEvent>;
}

/// In-memory append-only audit stream.
#[derive(Debug, Default)]
pub struct AuditMetricsCollector {
    events: Mutex<Vec<BindingEvent>>,
}

impl AuditMetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn emit(event: &BindingEvent) {
        let tier = event.tier().as_str();
        metrics::counter!(
            "capbind_binding_attempts_total",
            "outcome" => event.outcome.label(),
            "tier" => tier
        )
        .increment(1);

        if event.outcome.is_terminal() {
            metrics::histogram!("capbind_binding_duration_seconds", "tier" => tier)
                .record(event.duration.as_secs_f64());
        }

        match &event.outcome {
            BindingOutcome::Violation { count } => {
                warn!(subject = %event.subject, violations = count, "Binding rejected by compliance policy");
            }
            BindingOutcome::Error { kind } => {
                error!(subject = %event.subject, kind = %kind, "Binding failed");
            }
            outcome => {
                debug!(
                    subject = %event.subject,
                    outcome = outcome.label(),
                    duration_us = event.duration.as_micros() as u64,
                    "Binding event"
                );
            }
        }
    }
}

impl MetricsCollector for AuditMetricsCollector {
    fn record(&self, event: BindingEvent) {
        Self::emit(&event);
        self.events.lock().push(event);
    }

    fn events(&self) -> Vec<BindingEvent> {
        self.events.lock().clone()
    }
}

/// Aggregate counts over an event stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MetricsSummary {
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub successes: usize,
    pub violations: usize,
    pub errors: usize,
    /// Sum of terminal-event durations
    pub total_duration: Duration,
    /// Slowest terminal event
    pub max_duration: Duration,
    /// Terminal events per tier, in tier order
    pub attempts_by_tier: Vec<(ComplianceTier, usize)>,
}

impl MetricsSummary {
    pub fn from_events(events: &[BindingEvent]) -> Self {
        let mut summary = Self::default();
        let mut by_tier = [0usize; 3];

        for event in events {
            match event.outcome {
                BindingOutcome::CacheHit => summary.cache_hits += 1,
                BindingOutcome::CacheMiss => summary.cache_misses += 1,
                BindingOutcome::Success => summary.successes += 1,
                BindingOutcome::Violation { .. } => summary.violations += 1,
                BindingOutcome::Error { .. } => summary.errors += 1,
            }
            if event.outcome.is_terminal() {
                summary.total_duration += event.duration;
                summary.max_duration = summary.max_duration.max(event.duration);
                by_tier[event.tier() as usize] += 1;
            }
        }

        summary.attempts_by_tier = ComplianceTier::ALL
            .iter()
            .zip(by_tier)
            .filter(|(_, count)| *count > 0)
            .map(|(tier, count)| (*tier, count))
            .collect();
        summary
    }

    /// Cache hits over all attempts; `0.0` when nothing was attempted.
    pub fn hit_ratio(&self) -> f64 {
        let attempts = self.cache_hits + self.cache_misses;
        if attempts == 0 {
            0.0
        } else {
            self.cache_hits as f64 / attempts as f64
        }
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Synthesis Report
//!
//! Everything a synthesis run produced: one [`BindingRecord`] per successful binding,
//! the per-component [`ComponentAttachments`] folded from those records, every
//! [`SynthesisFailure`] (never truncated), and a [`MetricsSummary`] over the run's
//! audit events.
//!
//! Failures serialise as flat [`FailureRecord`]s so the JSON form carries the class,
//! the subject, the message and each violation with its remediation.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::domain::binding::{
    AccessMode, AccessStatement, Attachment, BindingResult, BindingSubject, ComplianceAction, ComplianceTier,
    NetworkRule,
};
use crate::domain::capability::DirectoryError;
use crate::domain::compliance::Violation;
use crate::domain::component::ComponentId;
use crate::domain::error::BindingError;
use crate::infrastructure::metrics::MetricsSummary;

/// A binding that could not be completed. The driver collects all of them.
#[derive(Debug, Clone, Error)]
pub enum SynthesisFailure {
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// The target component or capability is not in the directory.
    #[error("{subject}: unresolved target: {source}")]
    UnresolvedTarget {
        subject: BindingSubject,
        #[source]
        source: DirectoryError,
    },

    /// The binding names its own source component as the target.
    #[error("{subject}: component binds to itself")]
    SelfBinding { subject: BindingSubject },
}

impl SynthesisFailure {
    /// Taxonomy class shown to users.
    pub fn class(&self) -> String {
        match self {
            Self::Binding(error) => error.kind().to_string(),
            Self::UnresolvedTarget { .. } => "UnresolvedTarget".to_string(),
            Self::SelfBinding { .. } => "SelfBinding".to_string(),
        }
    }

    pub fn subject(&self) -> &BindingSubject {
        match self {
            Self::Binding(error) => error.subject(),
            Self::UnresolvedTarget { subject, .. } | Self::SelfBinding { subject } => subject,
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Binding(error) => error.violations(),
            Self::UnresolvedTarget { .. } | Self::SelfBinding { .. } => &[],
        }
    }

    pub fn as_binding_error(&self) -> Option<&BindingError> {
        match self {
            Self::Binding(error) => Some(error),
            Self::UnresolvedTarget { .. } | Self::SelfBinding { .. } => None,
        }
    }

    pub fn to_record(&self) -> FailureRecord {
        FailureRecord {
            class: self.class(),
            subject: self.subject().clone(),
            message: self.to_string(),
            violations: self.violations().to_vec(),
        }
    }
}

/// Serialisable view of a [`SynthesisFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub class: String,
    pub subject: BindingSubject,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

/// One successful binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingRecord {
    pub subject: BindingSubject,
    pub access: AccessMode,
    /// Synthesised by the driver rather than declared in the manifest
    pub injected: bool,
    pub fingerprint: String,
    pub result: BindingResult,
}

/// What one component must apply, folded across every binding touching it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComponentAttachments {
    pub environment_variables: BTreeMap<String, String>,
    pub access_statements: Vec<AccessStatement>,
    pub network_rules: Vec<NetworkRule>,
    pub compliance_actions: Vec<ComplianceAction>,
}

impl ComponentAttachments {
    pub fn is_empty(&self) -> bool {
        self.environment_variables.is_empty()
            && self.access_statements.is_empty()
            && self.network_rules.is_empty()
            && self.compliance_actions.is_empty()
    }

    /// Takes the parts of `result` that belong on `side`. Environment variables go to
    /// the source and compliance actions to the target. A variable already set to a
    /// different value keeps its first value.
    pub fn absorb(&mut self, owner: &ComponentId, side: Attachment, result: &BindingResult) {
        if side == Attachment::Source {
            for (name, value) in &result.environment_variables {
                match self.environment_variables.get(name) {
                    Some(existing) if existing != value => {
                        warn!(
                            component = %owner,
                            variable = %name,
                            kept = %existing,
                            ignored = %value,
                            "Conflicting environment variable from a second binding"
                        );
                    }
                    Some(_) => {}
                    None => {
                        self.environment_variables.insert(name.clone(), value.clone());
                    }
                }
            }
        } else {
            self.compliance_actions.extend(result.compliance_actions.iter().cloned());
        }

        self.access_statements.extend(
            result
                .access_statements
                .iter()
                .filter(|statement| statement.attach_to == side)
                .cloned(),
        );
        self.network_rules
            .extend(result.network_rules.iter().filter(|rule| rule.boundary == side).cloned());
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SynthesisReport {
    pub run_id: Uuid,
    pub manifest: String,
    pub environment: String,
    pub compliance_tier: ComplianceTier,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Bindings the plan contained, declared and injected
    pub planned: usize,
    pub bindings: Vec<BindingRecord>,
    pub attachments: BTreeMap<ComponentId, ComponentAttachments>,
    #[serde(serialize_with = "serialize_failures")]
    pub failures: Vec<SynthesisFailure>,
    pub metrics: MetricsSummary,
}

fn serialize_failures<S: Serializer>(failures: &[SynthesisFailure], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(failures.iter().map(SynthesisFailure::to_record))
}

impl SynthesisReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[SynthesisFailure] {
        &self.failures
    }

    /// Failure count per class, in class order.
    pub fn failures_by_class(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.class()).or_insert(0) += 1;
        }
        counts
    }

    pub fn attachments_for(&self, component: &ComponentId) -> Option<&ComponentAttachments> {
        self.attachments.get(component)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

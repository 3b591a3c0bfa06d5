// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Binding error taxonomy.
//!
//! Every class is deterministic for a given manifest and rule set, so none is retried.
//! Each carries the [`BindingSubject`] so a report can name the binding without the
//! original context at hand.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::binding::{BindingContext, BindingSubject};
use super::capability::CapabilityId;
use super::compliance::Violation;
use super::component::SourceType;
use super::strategy::StrategyError;

#[derive(Debug, Clone, Error)]
pub enum BindingError {
    /// No strategy exists for the pair. A manifest or configuration error.
    #[error("no binding strategy for source type '{source_type}' and capability '{capability}' ({subject})")]
    StrategyNotFound {
        subject: BindingSubject,
        source_type: SourceType,
        capability: CapabilityId,
    },

    /// The binding is well-formed but forbidden under the active tier.
    #[error("{subject} rejected by compliance policy with {} violation(s)", violations.len())]
    ComplianceViolation {
        subject: BindingSubject,
        violations: Vec<Violation>,
    },

    /// The strategy's computation failed, typically on a malformed payload.
    #[error("strategy '{strategy}' failed for {subject}: {source}")]
    ExecutionFailed {
        subject: BindingSubject,
        strategy: String,
        context: Box<BindingContext>,
        #[source]
        source: StrategyError,
    },
}

impl BindingError {
    pub fn kind(&self) -> BindingErrorKind {
        match self {
            Self::StrategyNotFound { .. } => BindingErrorKind::StrategyNotFound,
            Self::ComplianceViolation { .. } => BindingErrorKind::ComplianceViolation,
            Self::ExecutionFailed { .. } => BindingErrorKind::BindingExecution,
        }
    }

    pub fn subject(&self) -> &BindingSubject {
        match self {
            Self::StrategyNotFound { subject, .. }
            | Self::ComplianceViolation { subject, .. }
            | Self::ExecutionFailed { subject, .. } => subject,
        }
    }

    /// Ordered violations for compliance rejections; empty for other classes.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::ComplianceViolation { violations, .. } => violations,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BindingErrorKind {
    StrategyNotFound,
    ComplianceViolation,
    BindingExecution,
}

impl fmt::Display for BindingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrategyNotFound => f.write_str("StrategyNotFound"),
            Self::ComplianceViolation => f.write_str("ComplianceViolation"),
            Self::BindingExecution => f.write_str("BindingExecutionError"),
        }
    }
}

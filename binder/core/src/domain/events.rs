// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::binding::{BindingSubject, ComplianceTier};
use super::error::BindingErrorKind;

/// Outcome recorded for one step of a binding attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum BindingOutcome {
    CacheHit,
    CacheMiss,
    Success,
    Violation { count: usize },
    Error { kind: BindingErrorKind },
}

impl BindingOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CacheHit => "hit",
            Self::CacheMiss => "miss",
            Self::Success => "success",
            Self::Violation { .. } => "violation",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this event closes a binding attempt (everything except a miss).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::CacheMiss)
    }
}

/// Audit record for the append-only binding event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingEvent {
    pub subject: BindingSubject,
    pub outcome: BindingOutcome,
    pub duration: Duration,
    pub recorded_at: DateTime<Utc>,
}

impl BindingEvent {
    pub fn new(subject: BindingSubject, outcome: BindingOutcome, duration: Duration) -> Self {
        Self {
            subject,
            outcome,
            duration,
            recorded_at: Utc::now(),
        }
    }

    pub fn tier(&self) -> ComplianceTier {
        self.subject.compliance_tier
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Compliance Rules (data model)
//!
//! A [`ComplianceRule`] is plain data: an id, the lowest tier it applies at, a
//! [`PairMatcher`] scope, and a pure `check` function. Rules are assembled once at
//! process start and never mutated; the enforcer in
//! [`crate::application::compliance_enforcer`] selects and runs them.
//!
//! Numeric thresholds (retention days, alarm counts, trace sampling) live in
//! [`ComplianceSettings`], keyed by tier, and reach a binding only through the
//! [`ComplianceAction`] values a rule emits.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::binding::{BindingContext, ComplianceAction, ComplianceTier};
use super::capability::CapabilityId;
use super::component::SourceType;
use super::matcher::PairMatcher;

/// Payload flag a target sets to declare whether it accepts encrypted transport.
pub const TRANSPORT_ENCRYPTION_ATTR: &str = "transportEncryption";

/// Lowest tier at which encrypted transport to data and API endpoints is mandated.
pub const ENCRYPTED_TRANSPORT_TIER: ComplianceTier = ComplianceTier::Strict;

/// One itemised reason a binding is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub message: String,
    pub remediation: String,
}

impl Violation {
    pub fn new(
        rule_id: impl Into<String>,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            message: message.into(),
            remediation: remediation.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (remediation: {})", self.rule_id, self.message, self.remediation)
    }
}

/// What a single rule produced for a single context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOutcome {
    pub violations: Vec<Violation>,
    pub actions: Vec<ComplianceAction>,
}

impl RuleOutcome {
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn violation(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
            actions: Vec::new(),
        }
    }

    pub fn action(action: ComplianceAction) -> Self {
        Self {
            violations: Vec::new(),
            actions: vec![action],
        }
    }
}

/// Pure rule body. Must not read clocks, randomness or shared state.
pub type RuleCheck = fn(&BindingContext, &ComplianceSettings) -> RuleOutcome;

#[derive(Debug, Clone)]
pub struct ComplianceRule {
    pub id: String,
    /// Lowest tier the rule applies at; it also applies at every stricter tier.
    pub tier: ComplianceTier,
    pub description: String,
    pub scope: PairMatcher,
    pub check: RuleCheck,
}

impl ComplianceRule {
    pub fn new(
        id: impl Into<String>,
        tier: ComplianceTier,
        description: impl Into<String>,
        scope: PairMatcher,
        check: RuleCheck,
    ) -> Self {
        Self {
            id: id.into(),
            tier,
            description: description.into(),
            scope,
            check,
        }
    }

    pub fn applies_to(&self, source_type: &SourceType, capability: &CapabilityId, active: ComplianceTier) -> bool {
        self.tier <= active && self.scope.matches(source_type, capability)
    }

    pub fn evaluate(&self, context: &BindingContext, settings: &ComplianceSettings) -> RuleOutcome {
        (self.check)(context, settings)
    }
}

/// A value per compliance tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierValues<T> {
    pub baseline: T,
    pub elevated: T,
    pub strict: T,
}

impl<T: Copy> TierValues<T> {
    pub fn new(baseline: T, elevated: T, strict: T) -> Self {
        Self {
            baseline,
            elevated,
            strict,
        }
    }

    pub fn get(&self, tier: ComplianceTier) -> T {
        match tier {
            ComplianceTier::Baseline => self.baseline,
            ComplianceTier::Elevated => self.elevated,
            ComplianceTier::Strict => self.strict,
        }
    }
}

impl<T: Copy + PartialOrd> TierValues<T> {
    /// `baseline <= elevated <= strict`
    pub fn is_monotonic(&self) -> bool {
        self.baseline <= self.elevated && self.elevated <= self.strict
    }
}

/// Central per-tier compliance thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSettings {
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: TierValues<u32>,

    #[serde(default = "default_alarm_count")]
    pub alarm_count: TierValues<u32>,

    #[serde(default = "default_trace_sampling_percent")]
    pub trace_sampling_percent: TierValues<u8>,

    /// Environments where `admin` grants from compute to data stores are tolerated
    /// below the strict tier.
    #[serde(default = "default_admin_allowed_environments")]
    pub admin_allowed_environments: Vec<String>,
}

impl ComplianceSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.log_retention_days.is_monotonic() {
            anyhow::bail!("compliance.log_retention_days must not decrease from baseline to strict");
        }
        if !self.alarm_count.is_monotonic() {
            anyhow::bail!("compliance.alarm_count must not decrease from baseline to strict");
        }
        if !self.trace_sampling_percent.is_monotonic() {
            anyhow::bail!("compliance.trace_sampling_percent must not decrease from baseline to strict");
        }
        for tier in ComplianceTier::ALL {
            let percent = self.trace_sampling_percent.get(tier);
            if percent == 0 || percent > 100 {
                anyhow::bail!(
                    "compliance.trace_sampling_percent.{} must be within 1..=100 (got {})",
                    tier,
                    percent
                );
            }
        }
        Ok(())
    }
}

impl Default for ComplianceSettings {
    fn default() -> Self {
        Self {
            log_retention_days: default_log_retention_days(),
            alarm_count: default_alarm_count(),
            trace_sampling_percent: default_trace_sampling_percent(),
            admin_allowed_environments: default_admin_allowed_environments(),
        }
    }
}

fn default_log_retention_days() -> TierValues<u32> {
    TierValues::new(7, 90, 365)
}

fn default_alarm_count() -> TierValues<u32> {
    TierValues::new(0, 2, 5)
}

fn default_trace_sampling_percent() -> TierValues<u8> {
    TierValues::new(5, 25, 100)
}

fn default_admin_allowed_environments() -> Vec<String> {
    vec!["dev".to_string(), "sandbox".to_string()]
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Binding Model
//!
//! | Type | Role |
//! |------|------|
//! | [`BindingDirective`] | What the manifest asked for: capability + access mode |
//! | [`BindingContext`] | Fully materialised request handed to the registry |
//! | [`BindingContextKey`] | Structural cache identity of a context |
//! | [`BindingResult`] | Environment variables, access statements, network rules, compliance actions |
//! | [`BindingSubject`] | Source/target/capability/tier quadruple carried by errors and audit events |
//!
//! A context is built once and only ever shared by reference; there are no setters.
//! The key reduces the target payload to its identity (target component + capability
//! id) so that attribute churn inside a payload never splits cache entries.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::capability::{CapabilityId, CapabilityPayload};
use super::component::{ComponentId, SourceType};

/// Access requested by a binding directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
    Admin,
}

impl AccessMode {
    pub fn can_read(&self) -> bool {
        !matches!(self, Self::Write)
    }

    pub fn can_write(&self) -> bool {
        !matches!(self, Self::Read)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
            Self::ReadWrite => f.write_str("read-write"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// Ordered policy strictness: `Baseline < Elevated < Strict`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceTier {
    #[default]
    Baseline,
    Elevated,
    Strict,
}

impl ComplianceTier {
    pub const ALL: [ComplianceTier; 3] = [Self::Baseline, Self::Elevated, Self::Strict];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Elevated => "elevated",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for ComplianceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baseline" | "commercial" => Ok(Self::Baseline),
            "elevated" | "moderate" => Ok(Self::Elevated),
            "strict" | "high" => Ok(Self::Strict),
            other => Err(format!(
                "unknown compliance tier '{}' (expected baseline, elevated or strict)",
                other
            )),
        }
    }
}

/// Binding as declared in the manifest. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingDirective {
    pub capability: CapabilityId,
    pub access: AccessMode,
}

impl BindingDirective {
    pub fn new(capability: impl Into<CapabilityId>, access: AccessMode) -> Self {
        Self {
            capability: capability.into(),
            access,
        }
    }
}

/// Fully materialised binding request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingContext {
    source_component_id: ComponentId,
    source_type: SourceType,
    target_component_id: ComponentId,
    target_capability: CapabilityPayload,
    directive: BindingDirective,
    environment: String,
    compliance_tier: ComplianceTier,
}

impl BindingContext {
    pub fn new(
        source_component_id: ComponentId,
        source_type: SourceType,
        target_component_id: ComponentId,
        target_capability: CapabilityPayload,
        directive: BindingDirective,
        environment: impl Into<String>,
        compliance_tier: ComplianceTier,
    ) -> Self {
        Self {
            source_component_id,
            source_type,
            target_component_id,
            target_capability,
            directive,
            environment: environment.into(),
            compliance_tier,
        }
    }

    pub fn source_component_id(&self) -> &ComponentId {
        &self.source_component_id
    }

    pub fn source_type(&self) -> &SourceType {
        &self.source_type
    }

    pub fn target_component_id(&self) -> &ComponentId {
        &self.target_component_id
    }

    pub fn target_capability(&self) -> &CapabilityPayload {
        &self.target_capability
    }

    pub fn capability_id(&self) -> &CapabilityId {
        &self.target_capability.capability_id
    }

    pub fn directive(&self) -> &BindingDirective {
        &self.directive
    }

    pub fn access(&self) -> AccessMode {
        self.directive.access
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn compliance_tier(&self) -> ComplianceTier {
        self.compliance_tier
    }

    pub fn key(&self) -> BindingContextKey {
        BindingContextKey {
            source_component_id: self.source_component_id.clone(),
            source_type: self.source_type.clone(),
            target_component_id: self.target_component_id.clone(),
            capability_id: self.target_capability.capability_id.clone(),
            directive: self.directive.clone(),
            environment: self.environment.clone(),
            compliance_tier: self.compliance_tier,
        }
    }

    pub fn subject(&self) -> BindingSubject {
        BindingSubject {
            source_component_id: self.source_component_id.clone(),
            target_component_id: self.target_component_id.clone(),
            capability_id: self.target_capability.capability_id.clone(),
            compliance_tier: self.compliance_tier,
        }
    }
}

/// Structural identity of a [`BindingContext`]; includes tier and environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingContextKey {
    pub source_component_id: ComponentId,
    pub source_type: SourceType,
    pub target_component_id: ComponentId,
    pub capability_id: CapabilityId,
    pub directive: BindingDirective,
    pub environment: String,
    pub compliance_tier: ComplianceTier,
}

/// Who a binding was for. Carried by every error and audit event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingSubject {
    pub source_component_id: ComponentId,
    pub target_component_id: ComponentId,
    pub capability_id: CapabilityId,
    pub compliance_tier: ComplianceTier,
}

impl fmt::Display for BindingSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{}, {}]",
            self.source_component_id, self.target_component_id, self.capability_id, self.compliance_tier
        )
    }
}

/// Which side of a binding a statement or rule is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attachment {
    Source,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

/// One statement for a component's access-control document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessStatement {
    pub attach_to: Attachment,
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
    /// Principal granted access, for resource policies attached to the target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
}

impl AccessStatement {
    /// Identity policy statement for the source component.
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            attach_to: Attachment::Source,
            effect: Effect::Allow,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
            principal: None,
        }
    }

    /// Resource policy statement on the target granting `principal`.
    pub fn grant_to<A>(principal: impl Into<String>, actions: A, resource: impl Into<String>) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            attach_to: Attachment::Target,
            effect: Effect::Allow,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: vec![resource.into()],
            principal: Some(principal.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ingress,
    Egress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// A rule for the network boundary of one side of the binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRule {
    pub boundary: Attachment,
    pub direction: Direction,
    pub peer: ComponentId,
    pub protocol: Protocol,
    pub from_port: u16,
    pub to_port: u16,
    pub description: String,
}

impl NetworkRule {
    /// Ingress on the target's boundary from the source, for a single TCP port.
    pub fn tcp_ingress(peer: ComponentId, port: u16, description: impl Into<String>) -> Self {
        Self {
            boundary: Attachment::Target,
            direction: Direction::Ingress,
            peer,
            protocol: Protocol::Tcp,
            from_port: port,
            to_port: port,
            description: description.into(),
        }
    }

    /// Matching egress on the source's boundary towards the target.
    pub fn tcp_egress(peer: ComponentId, port: u16, description: impl Into<String>) -> Self {
        Self {
            boundary: Attachment::Source,
            direction: Direction::Egress,
            peer,
            protocol: Protocol::Tcp,
            from_port: port,
            to_port: port,
            description: description.into(),
        }
    }
}

/// Hardening the binding's target must apply. Every action is routed to the target,
/// including log retention and trace sampling, which the target enforces on the
/// traffic and telemetry it receives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ComplianceAction {
    EncryptedTransport,
    EncryptionAtRest,
    LogRetention { days: u32 },
    Alarms { count: u32 },
    AuditLogging,
    PrivateNetworking,
    TraceSampling { percent: u8 },
}

impl fmt::Display for ComplianceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncryptedTransport => f.write_str("require encrypted transport"),
            Self::EncryptionAtRest => f.write_str("require encryption at rest"),
            Self::LogRetention { days } => write!(f, "retain logs for {} days", days),
            Self::Alarms { count } => write!(f, "provision {} alarms", count),
            Self::AuditLogging => f.write_str("enable audit logging"),
            Self::PrivateNetworking => f.write_str("restrict to private networking"),
            Self::TraceSampling { percent } => write!(f, "sample {}% of traces", percent),
        }
    }
}

/// Outcome of one resolved binding. Produced once per unique [`BindingContextKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingResult {
    pub environment_variables: BTreeMap<String, String>,
    pub access_statements: Vec<AccessStatement>,
    pub network_rules: Vec<NetworkRule>,
    pub compliance_actions: Vec<ComplianceAction>,
}

impl BindingResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment_variables.insert(name.into(), value.into());
        self
    }

    pub fn with_statement(mut self, statement: AccessStatement) -> Self {
        self.access_statements.push(statement);
        self
    }

    pub fn with_network_rule(mut self, rule: NetworkRule) -> Self {
        self.network_rules.push(rule);
        self
    }

    pub fn with_action(mut self, action: ComplianceAction) -> Self {
        self.compliance_actions.push(action);
        self
    }

    /// Prepends rule-mandated actions ahead of the strategy's own, preserving both orders.
    pub fn with_mandatory_actions(mut self, mandatory: Vec<ComplianceAction>) -> Self {
        let own = std::mem::take(&mut self.compliance_actions);
        self.compliance_actions = mandatory;
        self.compliance_actions.extend(own);
        self
    }

    /// SHA-256 of the canonical JSON encoding. Stable across runs for equal results.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

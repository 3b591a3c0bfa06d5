// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Compliance Enforcer
//!
//! Evaluates the fixed rule set against a proposed binding. A rule applies when its
//! scope matches `(source type, capability)` and its tier is at or below the
//! context's tier (`baseline < elevated < strict`). Every applicable rule runs, in
//! table order; violations and mandated actions are concatenated.
//!
//! Enforcement is pure. It never reads the binding cache, a clock or any shared
//! state, so the same context and rule set always produce identical output.
//!
//! ## Built-in rules
//!
//! | Rule id | Tier | Scope |
//! |---------|------|-------|
//! | `BASE-ADMIN-DATASTORE` | baseline | compute → data stores |
//! | `BASE-PAYLOAD-ENDPOINT-PUBLIC` | baseline | any → db/cache |
//! | `ELEV-ENCRYPTION-AT-REST` | elevated | any → db/storage/cache/queue |
//! | `ELEV-LOG-RETENTION` | elevated | compute → any (retention on the target) |
//! | `ELEV-ALARMS` | elevated | compute → db/queue |
//! | `ELEV-TRACE-SAMPLING` | elevated | any → observability |
//! | `STRICT-ENCRYPTED-TRANSPORT` | strict | any → db/cache/queue/storage/api |
//! | `STRICT-NO-ADMIN` | strict | any → any |
//! | `STRICT-PRIVATE-NETWORK` | strict | compute → db/cache |
//! | `STRICT-AUDIT-LOGGING` | strict | any → any |

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::binding::{AccessMode, BindingContext, ComplianceAction, ComplianceTier};
use crate::domain::capability::{CapabilityId, CapabilityKind};
use crate::domain::compliance::{
    ComplianceRule, ComplianceSettings, RuleOutcome, Violation, ENCRYPTED_TRANSPORT_TIER, TRANSPORT_ENCRYPTION_ATTR,
};
use crate::domain::component::{SourceGroup, SourceType};
use crate::domain::matcher::{CapabilityMatcher, PairMatcher, SourceMatcher};

/// Result of [`ComplianceEnforcer::enforce`]. Approved when `violations` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementOutcome {
    pub violations: Vec<Violation>,
    pub actions: Vec<ComplianceAction>,
}

impl EnforcementOutcome {
    pub fn is_approved(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ComplianceEnforcer {
    rules: Vec<ComplianceRule>,
    settings: ComplianceSettings,
}

impl ComplianceEnforcer {
    pub fn new(rules: Vec<ComplianceRule>, settings: ComplianceSettings) -> Self {
        Self { rules, settings }
    }

    /// Enforcer loaded with [`standard_rules`].
    pub fn standard(settings: ComplianceSettings) -> Self {
        Self::new(standard_rules(), settings)
    }

    pub fn rules(&self) -> &[ComplianceRule] {
        &self.rules
    }

    pub fn settings(&self) -> &ComplianceSettings {
        &self.settings
    }

    /// Rules that would run for the pair at `tier`, in evaluation order.
    pub fn applicable_rules<'a>(
        &'a self,
        source_type: &'a SourceType,
        capability: &'a CapabilityId,
        tier: ComplianceTier,
    ) -> impl Iterator<Item = &'a ComplianceRule> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.applies_to(source_type, capability, tier))
    }

    pub fn enforce(&self, context: &BindingContext) -> EnforcementOutcome {
        let mut outcome = EnforcementOutcome::default();

        for rule in self.applicable_rules(context.source_type(), context.capability_id(), context.compliance_tier()) {
            let RuleOutcome { violations, actions } = rule.evaluate(context, &self.settings);
            debug!(
                rule = %rule.id,
                subject = %context.subject(),
                violations = violations.len(),
                actions = actions.len(),
                "Compliance rule evaluated"
            );
            outcome.violations.extend(violations);
            outcome.actions.extend(actions);
        }
        outcome
    }
}

const DATA_STORES: [CapabilityKind; 5] = [
    CapabilityKind::Database,
    CapabilityKind::Storage,
    CapabilityKind::Cache,
    CapabilityKind::Queue,
    CapabilityKind::Topic,
];

fn compute_to(capability: CapabilityMatcher) -> PairMatcher {
    PairMatcher::new(SourceMatcher::Group(SourceGroup::Compute), capability)
}

fn any_to(capability: CapabilityMatcher) -> PairMatcher {
    PairMatcher::new(SourceMatcher::Any, capability)
}

fn kinds(kinds: &[CapabilityKind]) -> CapabilityMatcher {
    CapabilityMatcher::OneOf(kinds.to_vec())
}

fn flag(context: &BindingContext, attribute: &str) -> Option<bool> {
    context.target_capability().bool_attr(attribute)
}

/// The platform's built-in rule set, in evaluation order.
pub fn standard_rules() -> Vec<ComplianceRule> {
    use CapabilityKind::*;

    vec![
        ComplianceRule::new(
            "BASE-ADMIN-DATASTORE",
            ComplianceTier::Baseline,
            "Compute components may not hold admin grants on data stores outside sandbox environments",
            compute_to(kinds(&DATA_STORES)),
            admin_datastore,
        ),
        ComplianceRule::new(
            "BASE-PAYLOAD-ENDPOINT-PUBLIC",
            ComplianceTier::Baseline,
            "Publicly reachable databases and caches only accept read or write-only bindings",
            any_to(kinds(&[Database, Cache])),
            public_endpoint,
        ),
        ComplianceRule::new(
            "ELEV-ENCRYPTION-AT-REST",
            ComplianceTier::Elevated,
            "Data at rest must be encrypted",
            any_to(kinds(&[Database, Storage, Cache, Queue])),
            encryption_at_rest,
        ),
        ComplianceRule::new(
            "ELEV-LOG-RETENTION",
            ComplianceTier::Elevated,
            "Targets bound from compute retain their access logs for the tier's retention period",
            compute_to(CapabilityMatcher::Any),
            log_retention,
        ),
        ComplianceRule::new(
            "ELEV-ALARMS",
            ComplianceTier::Elevated,
            "Databases and queues used by compute carry health alarms",
            compute_to(kinds(&[Database, Queue])),
            alarms,
        ),
        ComplianceRule::new(
            "ELEV-TRACE-SAMPLING",
            ComplianceTier::Elevated,
            "Traces are sampled at the tier's rate",
            any_to(CapabilityMatcher::Kind(Observability)),
            trace_sampling,
        ),
        ComplianceRule::new(
            "STRICT-ENCRYPTED-TRANSPORT",
            ENCRYPTED_TRANSPORT_TIER,
            "Traffic to data and API endpoints must be encrypted in transit",
            any_to(kinds(&[Database, Cache, Queue, Storage, Api])),
            encrypted_transport,
        ),
        ComplianceRule::new(
            "STRICT-NO-ADMIN",
            ComplianceTier::Strict,
            "No binding may grant admin access",
            any_to(CapabilityMatcher::Any),
            no_admin,
        ),
        ComplianceRule::new(
            "STRICT-PRIVATE-NETWORK",
            ComplianceTier::Strict,
            "Databases and caches are reachable from compute over private networks only",
            compute_to(kinds(&[Database, Cache])),
            private_network,
        ),
        ComplianceRule::new(
            "STRICT-AUDIT-LOGGING",
            ComplianceTier::Strict,
            "Every binding is audit logged",
            any_to(CapabilityMatcher::Any),
            audit_logging,
        ),
    ]
}

fn admin_datastore(context: &BindingContext, settings: &ComplianceSettings) -> RuleOutcome {
    let environment = context.environment();
    if context.access().is_admin() && !settings.admin_allowed_environments.iter().any(|e| e == environment) {
        return RuleOutcome::violation(Violation::new(
            "BASE-ADMIN-DATASTORE",
            format!(
                "'{}' requests admin access to '{}' in environment '{}'",
                context.source_component_id(),
                context.target_component_id(),
                environment
            ),
            format!(
                "Use read-write access, or run in one of: {}",
                settings.admin_allowed_environments.join(", ")
            ),
        ));
    }
    RuleOutcome::pass()
}

fn public_endpoint(context: &BindingContext, _: &ComplianceSettings) -> RuleOutcome {
    let elevated_access = matches!(context.access(), AccessMode::ReadWrite | AccessMode::Admin);
    if elevated_access && flag(context, "publiclyAccessible") == Some(true) {
        return RuleOutcome::violation(Violation::new(
            "BASE-PAYLOAD-ENDPOINT-PUBLIC",
            format!(
                "'{}' is publicly accessible and cannot accept {} access",
                context.target_component_id(),
                context.access()
            ),
            "Disable public accessibility on the target or narrow the binding to read or write",
        ));
    }
    RuleOutcome::pass()
}

fn encryption_at_rest(context: &BindingContext, _: &ComplianceSettings) -> RuleOutcome {
    if flag(context, "encryptionAtRestSupported") == Some(false) {
        return RuleOutcome::violation(Violation::new(
            "ELEV-ENCRYPTION-AT-REST",
            format!("'{}' does not support encryption at rest", context.target_component_id()),
            "Provision the target with an engine or storage class that supports encryption at rest",
        ));
    }
    RuleOutcome::action(ComplianceAction::EncryptionAtRest)
}

fn log_retention(context: &BindingContext, settings: &ComplianceSettings) -> RuleOutcome {
    RuleOutcome::action(ComplianceAction::LogRetention {
        days: settings.log_retention_days.get(context.compliance_tier()),
    })
}

fn alarms(context: &BindingContext, settings: &ComplianceSettings) -> RuleOutcome {
    match settings.alarm_count.get(context.compliance_tier()) {
        0 => RuleOutcome::pass(),
        count => RuleOutcome::action(ComplianceAction::Alarms { count }),
    }
}

fn trace_sampling(context: &BindingContext, settings: &ComplianceSettings) -> RuleOutcome {
    RuleOutcome::action(ComplianceAction::TraceSampling {
        percent: settings.trace_sampling_percent.get(context.compliance_tier()),
    })
}

fn encrypted_transport(context: &BindingContext, _: &ComplianceSettings) -> RuleOutcome {
    if flag(context, TRANSPORT_ENCRYPTION_ATTR) == Some(false) {
        return RuleOutcome::violation(Violation::new(
            "STRICT-ENCRYPTED-TRANSPORT",
            format!("'{}' does not support encrypted transport", context.target_component_id()),
            format!("Enable TLS on the target and set {}: true in its capability", TRANSPORT_ENCRYPTION_ATTR),
        ));
    }
    RuleOutcome::action(ComplianceAction::EncryptedTransport)
}

fn no_admin(context: &BindingContext, _: &ComplianceSettings) -> RuleOutcome {
    if context.access().is_admin() {
        return RuleOutcome::violation(Violation::new(
            "STRICT-NO-ADMIN",
            format!(
                "admin access from '{}' to '{}' is not permitted at the strict tier",
                context.source_component_id(),
                context.target_component_id()
            ),
            "Request the narrowest access mode the component needs",
        ));
    }
    RuleOutcome::pass()
}

fn private_network(context: &BindingContext, _: &ComplianceSettings) -> RuleOutcome {
    if flag(context, "publiclyAccessible") == Some(true) {
        return RuleOutcome::violation(Violation::new(
            "STRICT-PRIVATE-NETWORK",
            format!("'{}' is publicly accessible", context.target_component_id()),
            "Place the target in private subnets and set publiclyAccessible: false",
        ));
    }
    RuleOutcome::action(ComplianceAction::PrivateNetworking)
}

fn audit_logging(_: &BindingContext, _: &ComplianceSettings) -> RuleOutcome {
    RuleOutcome::action(ComplianceAction::AuditLogging)
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Binder Strategies and the Strategy Table
//!
//! A [`BinderStrategy`] turns one `(source type, capability)` pair into a
//! [`BindingResult`]. Strategies are stateless and pure: `bind` is a function of the
//! [`BindingContext`] alone and never reaches a provisioning backend. That purity is
//! what allows the registry to memoise results.
//!
//! ## Table contract
//!
//! [`StrategyTable`] is an explicit value built once at start-up and passed to the
//! registry. When several strategies claim a pair, [`StrategyTable::resolve`] picks by:
//!
//! 1. source specificity: exact type, then group, then any;
//! 2. capability specificity: exact id, then kind, then set of kinds, then any;
//! 3. registration order: first registered wins.
//!
//! Reordering registrations therefore only changes the outcome for pairs claimed by
//! two strategies of identical specificity.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::binding::{AccessMode, BindingContext, BindingResult};
use super::capability::CapabilityId;
use super::component::SourceType;
use super::matcher::PairMatcher;

/// Failure inside a strategy's pure computation, usually a malformed payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("capability '{capability}' payload is missing required attribute '{attribute}'")]
    MissingAttribute {
        capability: CapabilityId,
        attribute: String,
    },

    #[error("attribute '{attribute}' must be a {expected} (got {found})")]
    InvalidAttribute {
        attribute: String,
        expected: &'static str,
        found: String,
    },

    #[error("access mode '{access}' is not supported for capability '{capability}'")]
    UnsupportedAccess {
        capability: CapabilityId,
        access: AccessMode,
    },
}

pub trait BinderStrategy: Send + Sync {
    /// Stable name used in diagnostics and strategy listings.
    fn name(&self) -> &str;

    /// Pairs this strategy claims. Also determines its rank in the table.
    fn matcher(&self) -> PairMatcher;

    fn can_handle(&self, source_type: &SourceType, capability: &CapabilityId) -> bool {
        self.matcher().matches(source_type, capability)
    }

    fn bind(&self, context: &BindingContext) -> Result<BindingResult, StrategyError>;
}

struct StrategyEntry {
    registration: usize,
    matcher: PairMatcher,
    strategy: Arc<dyn BinderStrategy>,
}

impl StrategyEntry {
    fn rank(&self) -> (u8, u8, usize) {
        let (source, capability) = self.matcher.specificity();
        (source, capability, self.registration)
    }
}

/// Ordered set of strategies with a deterministic lookup rule (see module docs).
#[derive(Default)]
pub struct StrategyTable {
    entries: Vec<StrategyEntry>,
}

impl StrategyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, strategy: Arc<dyn BinderStrategy>) -> &mut Self {
        let registration = self.entries.len();
        self.entries.push(StrategyEntry {
            registration,
            matcher: strategy.matcher(),
            strategy,
        });
        self
    }

    pub fn with(mut self, strategy: Arc<dyn BinderStrategy>) -> Self {
        self.register(strategy);
        self
    }

    /// The strategy that handles `(source_type, capability)`, if any.
    pub fn resolve(
        &self,
        source_type: &SourceType,
        capability: &CapabilityId,
    ) -> Option<&Arc<dyn BinderStrategy>> {
        self.entries
            .iter()
            .filter(|entry| entry.strategy.can_handle(source_type, capability))
            .min_by_key(|entry| entry.rank())
            .map(|entry| &entry.strategy)
    }

    /// Every strategy claiming the pair, best candidate first.
    pub fn candidates(
        &self,
        source_type: &SourceType,
        capability: &CapabilityId,
    ) -> Vec<&Arc<dyn BinderStrategy>> {
        let mut matching: Vec<&StrategyEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.strategy.can_handle(source_type, capability))
            .collect();
        matching.sort_by_key(|entry| entry.rank());
        matching.into_iter().map(|entry| &entry.strategy).collect()
    }

    /// `(name, matcher)` for every registered strategy, in resolution precedence.
    pub fn listing(&self) -> Vec<(String, PairMatcher)> {
        let mut ordered: Vec<&StrategyEntry> = self.entries.iter().collect();
        ordered.sort_by_key(|entry| entry.rank());
        ordered
            .into_iter()
            .map(|entry| (entry.strategy.name().to_string(), entry.matcher.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for StrategyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.listing().iter().map(|(name, matcher)| format!("{} ({})", name, matcher)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capability::CapabilityKind;
    use crate::domain::component::SourceGroup;
    use crate::domain::matcher::{CapabilityMatcher, SourceMatcher};

    struct Named {
        name: &'static str,
        matcher: PairMatcher,
    }

    impl BinderStrategy for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn matcher(&self) -> PairMatcher {
            self.matcher.clone()
        }

        fn bind(&self, _context: &BindingContext) -> Result<BindingResult, StrategyError> {
            Ok(BindingResult::new().with_env("STRATEGY", self.name))
        }
    }

    fn named(name: &'static str, source: SourceMatcher, capability: CapabilityMatcher) -> Arc<dyn BinderStrategy> {
        Arc::new(Named {
            name,
            matcher: PairMatcher::new(source, capability),
        })
    }

    fn resolved(table: &StrategyTable, source: SourceType, capability: &str) -> Option<String> {
        table
            .resolve(&source, &capability.into())
            .map(|s| s.name().to_string())
    }

    #[test]
    fn test_exact_source_beats_group() {
        let group = named(
            "compute-db",
            SourceMatcher::Group(SourceGroup::Compute),
            CapabilityMatcher::Exact("db:postgres".into()),
        );
        let exact = named(
            "function-any",
            SourceMatcher::Exact(SourceType::ComputeFunction),
            CapabilityMatcher::Any,
        );

        for table in [
            StrategyTable::new().with(group.clone()).with(exact.clone()),
            StrategyTable::new().with(exact).with(group),
        ] {
            assert_eq!(
                resolved(&table, SourceType::ComputeFunction, "db:postgres").as_deref(),
                Some("function-any")
            );
            assert_eq!(
                resolved(&table, SourceType::Worker, "db:postgres").as_deref(),
                Some("compute-db")
            );
        }
    }

    #[test]
    fn test_first_registered_wins_on_equal_specificity() {
        let first = named(
            "first",
            SourceMatcher::Group(SourceGroup::Compute),
            CapabilityMatcher::Kind(CapabilityKind::Cache),
        );
        let second = named(
            "second",
            SourceMatcher::Group(SourceGroup::Compute),
            CapabilityMatcher::Kind(CapabilityKind::Cache),
        );
        let table = StrategyTable::new().with(first).with(second);

        assert_eq!(
            resolved(&table, SourceType::ComputeContainer, "cache:redis").as_deref(),
            Some("first")
        );
        let names: Vec<String> = table
            .candidates(&SourceType::ComputeContainer, &"cache:redis".into())
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_unknown_pair_is_unresolved() {
        let table = StrategyTable::new().with(named(
            "compute-cache",
            SourceMatcher::Group(SourceGroup::Compute),
            CapabilityMatcher::Kind(CapabilityKind::Cache),
        ));
        assert!(resolved(&table, SourceType::from("unregistered-type"), "cache:redis").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_listing_is_in_precedence_order() {
        let table = StrategyTable::new()
            .with(named("anything", SourceMatcher::Any, CapabilityMatcher::Any))
            .with(named(
                "gateway-compute",
                SourceMatcher::Exact(SourceType::ApiGateway),
                CapabilityMatcher::Kind(CapabilityKind::Compute),
            ));
        let names: Vec<String> = table.listing().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["gateway-compute", "anything"]);
    }
}

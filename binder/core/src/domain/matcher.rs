// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! `(source type, capability)` matchers shared by strategies and compliance rules.
//!
//! Each matcher reports a *specificity* (lower is more specific). The strategy table
//! orders candidates by source specificity, then capability specificity, then
//! registration order.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::capability::{CapabilityId, CapabilityKind};
use super::component::{SourceGroup, SourceType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceMatcher {
    Exact(SourceType),
    Group(SourceGroup),
    Any,
}

impl SourceMatcher {
    pub fn matches(&self, source_type: &SourceType) -> bool {
        match self {
            Self::Exact(expected) => expected == source_type,
            Self::Group(group) => source_type.in_group(*group),
            Self::Any => true,
        }
    }

    pub fn specificity(&self) -> u8 {
        match self {
            Self::Exact(_) => 0,
            Self::Group(_) => 1,
            Self::Any => 2,
        }
    }
}

impl fmt::Display for SourceMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(source_type) => write!(f, "{}", source_type),
            Self::Group(group) => write!(f, "<{}>", group),
            Self::Any => f.write_str("*"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityMatcher {
    Exact(CapabilityId),
    Kind(CapabilityKind),
    OneOf(Vec<CapabilityKind>),
    Any,
}

impl CapabilityMatcher {
    pub fn matches(&self, capability: &CapabilityId) -> bool {
        match self {
            Self::Exact(expected) => expected == capability,
            Self::Kind(kind) => &capability.kind() == kind,
            Self::OneOf(kinds) => kinds.contains(&capability.kind()),
            Self::Any => true,
        }
    }

    pub fn specificity(&self) -> u8 {
        match self {
            Self::Exact(_) => 0,
            Self::Kind(_) => 1,
            Self::OneOf(_) => 2,
            Self::Any => 3,
        }
    }
}

impl fmt::Display for CapabilityMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(id) => write!(f, "{}", id),
            Self::Kind(kind) => write!(f, "{}:*", kind),
            Self::OneOf(kinds) => {
                let names: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
                write!(f, "{{{}}}:*", names.join("|"))
            }
            Self::Any => f.write_str("*"),
        }
    }
}

/// A source matcher paired with a capability matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairMatcher {
    pub source: SourceMatcher,
    pub capability: CapabilityMatcher,
}

impl PairMatcher {
    pub fn new(source: SourceMatcher, capability: CapabilityMatcher) -> Self {
        Self { source, capability }
    }

    pub fn matches(&self, source_type: &SourceType, capability: &CapabilityId) -> bool {
        self.source.matches(source_type) && self.capability.matches(capability)
    }

    /// `(source specificity, capability specificity)`, compared lexicographically.
    pub fn specificity(&self) -> (u8, u8) {
        (self.source.specificity(), self.capability.specificity())
    }
}

impl fmt::Display for PairMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_matching() {
        let matcher = PairMatcher::new(
            SourceMatcher::Group(SourceGroup::Compute),
            CapabilityMatcher::Kind(CapabilityKind::Database),
        );
        assert!(matcher.matches(&SourceType::ComputeFunction, &"db:postgres".into()));
        assert!(matcher.matches(&SourceType::Worker, &"db:mysql".into()));
        assert!(!matcher.matches(&SourceType::ApiGateway, &"db:postgres".into()));
        assert!(!matcher.matches(&SourceType::ComputeFunction, &"cache:redis".into()));
        assert_eq!(matcher.to_string(), "<compute> -> database:*");
    }

    #[test]
    fn test_specificity_ordering() {
        let exact = PairMatcher::new(
            SourceMatcher::Exact(SourceType::ComputeFunction),
            CapabilityMatcher::Any,
        );
        let group = PairMatcher::new(
            SourceMatcher::Group(SourceGroup::Compute),
            CapabilityMatcher::Exact("db:postgres".into()),
        );
        // Source specificity dominates capability specificity
        assert!(exact.specificity() < group.specificity());

        let one_of = CapabilityMatcher::OneOf(vec![CapabilityKind::Cache, CapabilityKind::Queue]);
        assert!(one_of.matches(&"queue:sqs".into()));
        assert!(CapabilityMatcher::Kind(CapabilityKind::Cache).specificity() < one_of.specificity());
    }
}

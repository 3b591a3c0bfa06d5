// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Component identity and kind.
//!
//! [`SourceType`] is a closed enum over the component kinds the platform ships
//! with; manifests may still name kinds the engine has never heard of, which land in
//! [`SourceType::Other`] and simply find no strategy unless one is registered for them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Manifest-scoped component identifier (e.g. `orders-api`, `orders-db`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper snake-case form used as an environment variable prefix (`orders-db` → `ORDERS_DB`).
    pub fn env_prefix(&self) -> String {
        self.0
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Kind of a component, as declared by its manifest `type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceType {
    ComputeFunction,
    ComputeContainer,
    ComputeInstance,
    Worker,
    ApiGateway,
    Database,
    Storage,
    Cache,
    Queue,
    Other(String),
}

impl SourceType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ComputeFunction => "compute-function",
            Self::ComputeContainer => "compute-container",
            Self::ComputeInstance => "compute-instance",
            Self::Worker => "worker",
            Self::ApiGateway => "api-gateway",
            Self::Database => "database",
            Self::Storage => "storage",
            Self::Cache => "cache",
            Self::Queue => "queue",
            Self::Other(name) => name,
        }
    }

    pub fn in_group(&self, group: SourceGroup) -> bool {
        match group {
            SourceGroup::Compute => matches!(
                self,
                Self::ComputeFunction | Self::ComputeContainer | Self::ComputeInstance | Self::Worker
            ),
            SourceGroup::DataStore => {
                matches!(self, Self::Database | Self::Storage | Self::Cache | Self::Queue)
            }
        }
    }

    pub fn is_compute(&self) -> bool {
        self.in_group(SourceGroup::Compute)
    }
}

impl From<&str> for SourceType {
    fn from(value: &str) -> Self {
        match value {
            "compute-function" | "lambda" => Self::ComputeFunction,
            "compute-container" | "container" => Self::ComputeContainer,
            "compute-instance" | "instance" => Self::ComputeInstance,
            "worker" => Self::Worker,
            "api-gateway" => Self::ApiGateway,
            "database" => Self::Database,
            "storage" => Self::Storage,
            "cache" => Self::Cache,
            "queue" => Self::Queue,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for SourceType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<SourceType> for String {
    fn from(value: SourceType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named groups of source types that wildcard strategies and rules can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceGroup {
    Compute,
    DataStore,
}

impl fmt::Display for SourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compute => f.write_str("compute"),
            Self::DataStore => f.write_str("data-store"),
        }
    }
}

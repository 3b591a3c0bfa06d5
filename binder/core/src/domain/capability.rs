// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Capability Value Objects and Directory
//!
//! A *capability* is a named contract a component provides once it has finished its
//! own synthesis (`db:postgres`, `storage:s3`, `queue:sqs`). The identifier is a
//! `namespace:name` string; the namespace maps onto the closed [`CapabilityKind`]
//! enum so strategies and compliance rules can match whole families without string
//! comparisons. Unknown namespaces fall back to [`CapabilityKind::Custom`].
//!
//! The [`CapabilityDirectory`] is the leaf of the engine: a read-mostly map from
//! component to the capabilities it provides, each with an opaque attribute payload
//! (hosts, ports, ARNs, feature flags).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::component::ComponentId;

/// Capability identifier of the form `namespace:name` (e.g. `db:postgres`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityId(String);

impl CapabilityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace part (`db` in `db:postgres`). An identifier without a colon is all namespace.
    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map(|(ns, _)| ns).unwrap_or(&self.0)
    }

    /// Name part (`postgres` in `db:postgres`), if present.
    pub fn name(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, name)| name)
    }

    pub fn kind(&self) -> CapabilityKind {
        CapabilityKind::from_namespace(self.namespace())
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CapabilityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CapabilityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Known capability families, keyed by identifier namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityKind {
    Database,
    Storage,
    Cache,
    Queue,
    Topic,
    Compute,
    Api,
    Secret,
    Observability,
    Custom(String),
}

impl CapabilityKind {
    pub fn from_namespace(namespace: &str) -> Self {
        match namespace {
            "db" | "database" => Self::Database,
            "storage" | "bucket" => Self::Storage,
            "cache" => Self::Cache,
            "queue" => Self::Queue,
            "topic" => Self::Topic,
            "compute" | "function" => Self::Compute,
            "api" => Self::Api,
            "secret" => Self::Secret,
            "observability" | "telemetry" => Self::Observability,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Kinds that hold data on behalf of other components.
    pub fn is_data_store(&self) -> bool {
        matches!(
            self,
            Self::Database | Self::Storage | Self::Cache | Self::Queue | Self::Topic
        )
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database => f.write_str("database"),
            Self::Storage => f.write_str("storage"),
            Self::Cache => f.write_str("cache"),
            Self::Queue => f.write_str("queue"),
            Self::Topic => f.write_str("topic"),
            Self::Compute => f.write_str("compute"),
            Self::Api => f.write_str("api"),
            Self::Secret => f.write_str("secret"),
            Self::Observability => f.write_str("observability"),
            Self::Custom(ns) => write!(f, "custom({})", ns),
        }
    }
}

/// Scalar attribute carried in a [`CapabilityPayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Non-negative integral numbers only; `5432.0` is accepted, `54.5` is not.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64 => {
                Some(*n as u64)
            }
            // Payloads produced from environment-style config often stringify ports
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u16> for AttributeValue {
    fn from(value: u16) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Capability data published by the producing component. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityPayload {
    pub capability_id: CapabilityId,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl CapabilityPayload {
    pub fn new(capability_id: impl Into<CapabilityId>) -> Self {
        Self {
            capability_id: capability_id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn str_attr(&self, key: &str) -> Option<&str> {
        self.attribute(key).and_then(AttributeValue::as_str)
    }

    pub fn bool_attr(&self, key: &str) -> Option<bool> {
        self.attribute(key).and_then(AttributeValue::as_bool)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("component '{component}' already registered capability '{capability}'")]
    DuplicateCapability {
        component: ComponentId,
        capability: CapabilityId,
    },

    #[error("component '{0}' has not registered any capabilities")]
    ComponentNotFound(ComponentId),

    #[error("component '{component}' does not provide capability '{capability}' (provides: {})", provided.join(", "))]
    CapabilityNotProvided {
        component: ComponentId,
        capability: CapabilityId,
        provided: Vec<String>,
    },
}

/// Component → provided capabilities. Populated as each component finishes synthesis.
#[derive(Debug, Clone, Default)]
pub struct CapabilityDirectory {
    entries: BTreeMap<ComponentId, BTreeMap<CapabilityId, CapabilityPayload>>,
}

impl CapabilityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        component: ComponentId,
        payload: CapabilityPayload,
    ) -> Result<(), DirectoryError> {
        let provided = self.entries.entry(component.clone()).or_default();
        if provided.contains_key(&payload.capability_id) {
            return Err(DirectoryError::DuplicateCapability {
                component,
                capability: payload.capability_id,
            });
        }
        provided.insert(payload.capability_id.clone(), payload);
        Ok(())
    }

    pub fn resolve(
        &self,
        component: &ComponentId,
        capability: &CapabilityId,
    ) -> Result<&CapabilityPayload, DirectoryError> {
        let provided = self
            .entries
            .get(component)
            .ok_or_else(|| DirectoryError::ComponentNotFound(component.clone()))?;

        provided
            .get(capability)
            .ok_or_else(|| DirectoryError::CapabilityNotProvided {
                component: component.clone(),
                capability: capability.clone(),
                provided: provided.keys().map(|c| c.to_string()).collect(),
            })
    }

    pub fn provided_by(&self, component: &ComponentId) -> impl Iterator<Item = &CapabilityPayload> {
        self.entries.get(component).into_iter().flat_map(|m| m.values())
    }

    /// Components providing `capability`, in id order.
    pub fn providers_of(&self, capability: &CapabilityId) -> Vec<&ComponentId> {
        self.entries
            .iter()
            .filter(|(_, provided)| provided.contains_key(capability))
            .map(|(component, _)| component)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Service manifest types (Kubernetes-style `apiVersion`/`kind`/`metadata`/`spec`).
//!
//! ```yaml
//! apiVersion: capbind.dev/v1
//! kind: ServiceManifest
//! metadata:
//!   name: orders
//! spec:
//!   environment: prod
//!   compliance_tier: strict
//!   components:
//!     - id: orders-api
//!       type: compute-function
//!       bindings:
//!         - target: orders-db
//!           capability: db:postgres
//!           access: read-write
//!     - id: orders-db
//!       type: database
//!       provides:
//!         - capability: db:postgres
//!           attributes:
//!             host: orders.cluster.internal
//!             port: 5432
//! ```
//!
//! Binding targets are not cross-checked by [`ServiceManifest::validate`]; an
//! unresolvable or self-referencing target fails only its own binding during synthesis.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::binding::{AccessMode, BindingDirective, ComplianceTier};
use super::capability::{AttributeValue, CapabilityId, CapabilityPayload};
use super::component::{ComponentId, SourceType};

pub const MANIFEST_API_VERSION: &str = "capbind.dev/v1";
pub const SERVICE_MANIFEST_KIND: &str = "ServiceManifest";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("invalid apiVersion '{0}', must be '{expected}'", expected = MANIFEST_API_VERSION)]
    InvalidApiVersion(String),

    #[error("invalid kind '{0}', must be '{expected}'", expected = SERVICE_MANIFEST_KIND)]
    InvalidKind(String),

    #[error("metadata.name cannot be empty")]
    EmptyName,

    #[error("component at index {0} has an empty id")]
    EmptyComponentId(usize),

    #[error("component '{0}' is declared more than once")]
    DuplicateComponent(ComponentId),

    #[error("component '{component}' provides '{capability}' more than once")]
    DuplicateCapability {
        component: ComponentId,
        capability: CapabilityId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceManifest {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ManifestMetadata,
    pub spec: ServiceSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Overrides the configured synthesis environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Overrides the configured compliance tier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_tier: Option<ComplianceTier>,

    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub id: ComponentId,

    #[serde(rename = "type")]
    pub component_type: SourceType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<ProvidedCapability>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<BindingSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvidedCapability {
    pub capability: CapabilityId,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl ProvidedCapability {
    pub fn to_payload(&self) -> CapabilityPayload {
        CapabilityPayload {
            capability_id: self.capability.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSpec {
    pub target: ComponentId,
    pub capability: CapabilityId,
    pub access: AccessMode,
}

impl BindingSpec {
    pub fn directive(&self) -> BindingDirective {
        BindingDirective::new(self.capability.clone(), self.access)
    }
}

impl ServiceManifest {
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.api_version != MANIFEST_API_VERSION {
            return Err(ManifestError::InvalidApiVersion(self.api_version.clone()));
        }
        if self.kind != SERVICE_MANIFEST_KIND {
            return Err(ManifestError::InvalidKind(self.kind.clone()));
        }
        if self.metadata.name.trim().is_empty() {
            return Err(ManifestError::EmptyName);
        }

        let mut seen = BTreeSet::new();
        for (index, component) in self.spec.components.iter().enumerate() {
            if component.id.as_str().trim().is_empty() {
                return Err(ManifestError::EmptyComponentId(index));
            }
            if !seen.insert(&component.id) {
                return Err(ManifestError::DuplicateComponent(component.id.clone()));
            }

            let mut provided = BTreeSet::new();
            for capability in &component.provides {
                if !provided.insert(&capability.capability) {
                    return Err(ManifestError::DuplicateCapability {
                        component: component.id.clone(),
                        capability: capability.capability.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn component(&self, id: &ComponentId) -> Option<&ComponentSpec> {
        self.spec.components.iter().find(|c| &c.id == id)
    }

    /// Number of declared (not injected) bindings.
    pub fn binding_count(&self) -> usize {
        self.spec.components.iter().map(|c| c.bindings.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> ServiceManifest {
        ServiceManifest {
            api_version: MANIFEST_API_VERSION.to_string(),
            kind: SERVICE_MANIFEST_KIND.to_string(),
            metadata: ManifestMetadata {
                name: "orders".to_string(),
                version: None,
                labels: BTreeMap::new(),
            },
            spec: ServiceSpec {
                environment: None,
                compliance_tier: None,
                components: vec![
                    ComponentSpec {
                        id: ComponentId::new("orders-api"),
                        component_type: SourceType::ComputeFunction,
                        provides: vec![],
                        bindings: vec![BindingSpec {
                            target: ComponentId::new("orders-db"),
                            capability: "db:postgres".into(),
                            access: AccessMode::ReadWrite,
                        }],
                    },
                    ComponentSpec {
                        id: ComponentId::new("orders-db"),
                        component_type: SourceType::Database,
                        provides: vec![ProvidedCapability {
                            capability: "db:postgres".into(),
                            attributes: BTreeMap::new(),
                        }],
                        bindings: vec![],
                    },
                ],
            },
        }
    }

    #[test]
    fn test_valid_manifest() {
        let manifest = manifest();
        assert!(manifest.validate().is_ok());
        assert_eq!(manifest.binding_count(), 1);
        assert!(manifest.component(&ComponentId::new("orders-db")).is_some());
    }

    #[test]
    fn test_validation_failures() {
        let mut m = manifest();
        m.kind = "DeploymentManifest".to_string();
        assert_eq!(m.validate(), Err(ManifestError::InvalidKind("DeploymentManifest".to_string())));

        let mut m = manifest();
        m.spec.components.push(m.spec.components[1].clone());
        assert_eq!(
            m.validate(),
            Err(ManifestError::DuplicateComponent(ComponentId::new("orders-db")))
        );

        let mut m = manifest();
        let dup = m.spec.components[1].provides[0].clone();
        m.spec.components[1].provides.push(dup);
        assert!(matches!(m.validate(), Err(ManifestError::DuplicateCapability { .. })));
    }

    #[test]
    fn test_unknown_targets_are_not_a_manifest_error() {
        let mut m = manifest();
        m.spec.components[0].bindings[0].target = ComponentId::new("ghost");
        assert!(m.validate().is_ok());

        let mut m = manifest();
        m.spec.components[0].bindings[0].target = ComponentId::new("orders-api");
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_error_messages_name_expected_values() {
        assert_eq!(
            ManifestError::InvalidApiVersion("v2".to_string()).to_string(),
            "invalid apiVersion 'v2', must be 'capbind.dev/v1'"
        );
        assert_eq!(
            ManifestError::InvalidKind("Pod".to_string()).to_string(),
            "invalid kind 'Pod', must be 'ServiceManifest'"
        );
    }
}

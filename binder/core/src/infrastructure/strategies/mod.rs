// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Built-in Binder Strategies
//!
//! Relationship strategies translate a provisioned target's capability into access
//! statements, network rules and environment variables for the source. The
//! observability strategy attaches tier-dependent telemetry wiring.
//!
//! | Strategy | Source | Capability |
//! |----------|--------|------------|
//! | [`database::DatabaseStrategy`] | compute group | `db:*` |
//! | [`storage::StorageStrategy`] | compute group | `storage:*` |
//! | [`cache::CacheStrategy`] | compute group | `cache:*` |
//! | [`queue::QueueStrategy`] | compute group | `queue:*`, `topic:*` |
//! | [`compute::FunctionInvokeStrategy`] | compute group | `compute:*` |
//! | [`gateway::GatewayIntegrationStrategy`] | `api-gateway` | `compute:*` |
//! | [`gateway::ApiInvokeStrategy`] | compute group | `api:*` |
//! | [`secret::SecretStrategy`] | any | `secret:*` |
//! | [`observability::ObservabilityStrategy`] | any | `observability:*` |
//!
//! Environment variable names are prefixed with the target component id in upper
//! snake case (`orders-db` → `ORDERS_DB_HOST`).

pub mod cache;
pub mod compute;
pub mod database;
pub mod gateway;
pub mod observability;
pub mod queue;
pub mod secret;
pub mod storage;

use std::sync::Arc;

use crate::domain::binding::BindingContext;
use crate::domain::strategy::{StrategyError, StrategyTable};

/// The platform's strategy table, in registration order.
pub fn default_strategy_table() -> StrategyTable {
    StrategyTable::new()
        .with(Arc::new(database::DatabaseStrategy))
        .with(Arc::new(storage::StorageStrategy))
        .with(Arc::new(cache::CacheStrategy))
        .with(Arc::new(queue::QueueStrategy))
        .with(Arc::new(compute::FunctionInvokeStrategy))
        .with(Arc::new(gateway::GatewayIntegrationStrategy))
        .with(Arc::new(gateway::ApiInvokeStrategy))
        .with(Arc::new(secret::SecretStrategy))
        .with(Arc::new(observability::ObservabilityStrategy))
}

pub(crate) fn require_str<'a>(
    context: &'a BindingContext,
    attribute: &str,
) -> Result<&'a str, StrategyError> {
    optional_str(context, attribute)?.ok_or_else(|| StrategyError::MissingAttribute {
        capability: context.capability_id().clone(),
        attribute: attribute.to_string(),
    })
}

/// `Ok(None)` when absent; an error when present with the wrong type or empty.
pub(crate) fn optional_str<'a>(
    context: &'a BindingContext,
    attribute: &str,
) -> Result<Option<&'a str>, StrategyError> {
    match context.target_capability().attribute(attribute) {
        None => Ok(None),
        Some(value) => match value.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(Some(s)),
            Some(_) => Err(StrategyError::InvalidAttribute {
                attribute: attribute.to_string(),
                expected: "non-empty string",
                found: "empty string".to_string(),
            }),
            None => Err(StrategyError::InvalidAttribute {
                attribute: attribute.to_string(),
                expected: "string",
                found: value.type_name().to_string(),
            }),
        },
    }
}

pub(crate) fn require_port(context: &BindingContext, attribute: &str) -> Result<u16, StrategyError> {
    optional_port(context, attribute)?.ok_or_else(|| StrategyError::MissingAttribute {
        capability: context.capability_id().clone(),
        attribute: attribute.to_string(),
    })
}

pub(crate) fn optional_port(
    context: &BindingContext,
    attribute: &str,
) -> Result<Option<u16>, StrategyError> {
    match context.target_capability().attribute(attribute) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .filter(|port| *port != 0)
            .map(Some)
            .ok_or_else(|| StrategyError::InvalidAttribute {
                attribute: attribute.to_string(),
                expected: "port number (1-65535)",
                found: value.to_string(),
            }),
    }
}

pub(crate) fn optional_bool(
    context: &BindingContext,
    attribute: &str,
) -> Result<Option<bool>, StrategyError> {
    match context.target_capability().attribute(attribute) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| StrategyError::InvalidAttribute {
                attribute: attribute.to_string(),
                expected: "bool",
                found: value.type_name().to_string(),
            }),
    }
}

/// `<TARGET>_<SUFFIX>`
pub(crate) fn env_name(context: &BindingContext, suffix: &str) -> String {
    format!("{}_{}", context.target_component_id().env_prefix(), suffix)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::binding::{AccessMode, BindingContext, BindingDirective, ComplianceTier};
    use crate::domain::capability::CapabilityPayload;
    use crate::domain::component::{ComponentId, SourceType};

    pub fn context(
        source_type: SourceType,
        target: &str,
        payload: CapabilityPayload,
        access: AccessMode,
        tier: ComplianceTier,
    ) -> BindingContext {
        let directive = BindingDirective::new(payload.capability_id.clone(), access);
        BindingContext::new(
            ComponentId::new("orders-api"),
            source_type,
            ComponentId::new(target),
            payload,
            directive,
            "prod",
            tier,
        )
    }
}

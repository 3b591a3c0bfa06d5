// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Compute → in-memory cache cluster.

use crate::domain::binding::{AccessStatement, BindingContext, BindingResult, NetworkRule};
use crate::domain::capability::CapabilityKind;
use crate::domain::compliance::{ENCRYPTED_TRANSPORT_TIER, TRANSPORT_ENCRYPTION_ATTR};
use crate::domain::component::SourceGroup;
use crate::domain::matcher::{CapabilityMatcher, PairMatcher, SourceMatcher};
use crate::domain::strategy::{BinderStrategy, StrategyError};

use super::{env_name, optional_bool, optional_str, require_port, require_str};

pub struct CacheStrategy;

impl BinderStrategy for CacheStrategy {
    fn name(&self) -> &str {
        "cache"
    }

    fn matcher(&self) -> PairMatcher {
        PairMatcher::new(
            SourceMatcher::Group(SourceGroup::Compute),
            CapabilityMatcher::Kind(CapabilityKind::Cache),
        )
    }

    /// Cache clusters have no management plane reachable through a binding, so
    /// `admin` is refused. The URL uses TLS when the target declares it or when the
    /// tier mandates encrypted transport.
    fn bind(&self, context: &BindingContext) -> Result<BindingResult, StrategyError> {
        if context.access().is_admin() {
            return Err(StrategyError::UnsupportedAccess {
                capability: context.capability_id().clone(),
                access: context.access(),
            });
        }

        let host = require_str(context, "host")?;
        let port = require_port(context, "port")?;
        let tls = optional_bool(context, TRANSPORT_ENCRYPTION_ATTR)?
            .unwrap_or(context.compliance_tier() >= ENCRYPTED_TRANSPORT_TIER);
        let scheme = match (context.capability_id().name(), tls) {
            (Some("memcached"), _) => "memcached",
            (_, true) => "rediss",
            (_, false) => "redis",
        };
        let source = context.source_component_id();
        let target = context.target_component_id();

        let mut result = BindingResult::new()
            .with_env(env_name(context, "HOST"), host)
            .with_env(env_name(context, "PORT"), port.to_string())
            .with_env(env_name(context, "URL"), format!("{}://{}:{}", scheme, host, port))
            .with_network_rule(NetworkRule::tcp_ingress(
                source.clone(),
                port,
                format!("{} from {}", context.capability_id(), source),
            ))
            .with_network_rule(NetworkRule::tcp_egress(
                target.clone(),
                port,
                format!("{} to {}", context.capability_id(), target),
            ));

        if let Some(cluster_arn) = optional_str(context, "resourceArn")? {
            result = result.with_statement(AccessStatement::allow(["elasticache:Connect"], [cluster_arn]));
        }
        if let Some(secret_arn) = optional_str(context, "authSecretArn")? {
            result = result
                .with_env(env_name(context, "AUTH_SECRET_ARN"), secret_arn)
                .with_statement(AccessStatement::allow(["secretsmanager:GetSecretValue"], [secret_arn]));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::binding::{AccessMode, ComplianceTier};
    use crate::domain::capability::CapabilityPayload;
    use crate::domain::component::SourceType;
    use crate::infrastructure::strategies::test_support::context;

    fn payload() -> CapabilityPayload {
        CapabilityPayload::new("cache:redis")
            .with_attribute("host", "sessions.cache.internal")
            .with_attribute("port", 6379u16)
    }

    #[test]
    fn test_redis_url_and_network() {
        let ctx = context(SourceType::Worker, "sessions", payload(), AccessMode::ReadWrite, ComplianceTier::Baseline);
        let result = CacheStrategy.bind(&ctx).unwrap();

        assert_eq!(result.environment_variables["SESSIONS_URL"], "redis://sessions.cache.internal:6379");
        assert_eq!(result.network_rules.len(), 2);
        assert!(result.access_statements.is_empty());
    }

    #[test]
    fn test_tls_and_auth() {
        let ctx = context(
            SourceType::ComputeFunction,
            "sessions",
            payload()
                .with_attribute("transportEncryption", true)
                .with_attribute("authSecretArn", "arn:aws:secretsmanager:eu-west-1:1:secret:redis"),
            AccessMode::Read,
            ComplianceTier::Baseline,
        );
        let result = CacheStrategy.bind(&ctx).unwrap();
        assert!(result.environment_variables["SESSIONS_URL"].starts_with("rediss://"));
        assert_eq!(result.access_statements.len(), 1);
    }

    #[test]
    fn test_strict_tier_uses_tls_without_flag() {
        let ctx = context(SourceType::Worker, "sessions", payload(), AccessMode::ReadWrite, ComplianceTier::Strict);
        let result = CacheStrategy.bind(&ctx).unwrap();
        assert_eq!(result.environment_variables["SESSIONS_URL"], "rediss://sessions.cache.internal:6379");

        let ctx = context(SourceType::Worker, "sessions", payload(), AccessMode::ReadWrite, ComplianceTier::Elevated);
        let result = CacheStrategy.bind(&ctx).unwrap();
        assert!(result.environment_variables["SESSIONS_URL"].starts_with("redis://"));
    }

    #[test]
    fn test_admin_is_refused() {
        let ctx = context(SourceType::Worker, "sessions", payload(), AccessMode::Admin, ComplianceTier::Baseline);
        assert!(matches!(
            CacheStrategy.bind(&ctx),
            Err(StrategyError::UnsupportedAccess { access: AccessMode::Admin, .. })
        ));
    }
}

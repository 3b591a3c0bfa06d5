// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Any source → managed secret.

use crate::domain::binding::{AccessMode, AccessStatement, BindingContext, BindingResult};
use crate::domain::capability::CapabilityKind;
use crate::domain::matcher::{CapabilityMatcher, PairMatcher, SourceMatcher};
use crate::domain::strategy::{BinderStrategy, StrategyError};

use super::{env_name, optional_str, require_str};

pub struct SecretStrategy;

impl BinderStrategy for SecretStrategy {
    fn name(&self) -> &str {
        "secret"
    }

    fn matcher(&self) -> PairMatcher {
        PairMatcher::new(SourceMatcher::Any, CapabilityMatcher::Kind(CapabilityKind::Secret))
    }

    fn bind(&self, context: &BindingContext) -> Result<BindingResult, StrategyError> {
        let secret_arn = require_str(context, "secretArn")?;
        let access = context.access();

        let actions: Vec<&str> = match access {
            AccessMode::Read => vec!["secretsmanager:GetSecretValue", "secretsmanager:DescribeSecret"],
            AccessMode::Write => vec!["secretsmanager:PutSecretValue", "secretsmanager:UpdateSecret"],
            AccessMode::ReadWrite => vec![
                "secretsmanager:GetSecretValue",
                "secretsmanager:DescribeSecret",
                "secretsmanager:PutSecretValue",
                "secretsmanager:UpdateSecret",
            ],
            AccessMode::Admin => vec!["secretsmanager:*"],
        };

        let mut result = BindingResult::new()
            .with_env(env_name(context, "SECRET_ARN"), secret_arn)
            .with_statement(AccessStatement::allow(actions, [secret_arn]));

        if let Some(key_arn) = optional_str(context, "kmsKeyArn")? {
            let key_action = if access.can_read() { "kms:Decrypt" } else { "kms:Encrypt" };
            result = result.with_statement(AccessStatement::allow([key_action], [key_arn]));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::binding::ComplianceTier;
    use crate::domain::capability::CapabilityPayload;
    use crate::domain::component::SourceType;
    use crate::infrastructure::strategies::test_support::context;

    #[test]
    fn test_read_secret_from_any_source() {
        for source in [SourceType::ApiGateway, SourceType::Database, SourceType::Worker] {
            let ctx = context(
                source,
                "stripe-key",
                CapabilityPayload::new("secret:secretsmanager")
                    .with_attribute("secretArn", "arn:aws:secretsmanager:eu-west-1:123:secret:stripe"),
                AccessMode::Read,
                ComplianceTier::Baseline,
            );
            let result = SecretStrategy.bind(&ctx).unwrap();
            assert_eq!(
                result.environment_variables["STRIPE_KEY_SECRET_ARN"],
                "arn:aws:secretsmanager:eu-west-1:123:secret:stripe"
            );
            assert_eq!(result.access_statements[0].actions[0], "secretsmanager:GetSecretValue");
        }
    }

    #[test]
    fn test_write_with_key() {
        let ctx = context(
            SourceType::ComputeFunction,
            "rotation",
            CapabilityPayload::new("secret:secretsmanager")
                .with_attribute("secretArn", "arn:s")
                .with_attribute("kmsKeyArn", "arn:k"),
            AccessMode::Write,
            ComplianceTier::Strict,
        );
        let result = SecretStrategy.bind(&ctx).unwrap();
        assert_eq!(result.access_statements[1].actions, vec!["kms:Encrypt"]);
    }
}

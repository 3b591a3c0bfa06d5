// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Compute → function invocation.

use crate::domain::binding::{AccessMode, AccessStatement, BindingContext, BindingResult};
use crate::domain::capability::CapabilityKind;
use crate::domain::component::SourceGroup;
use crate::domain::matcher::{CapabilityMatcher, PairMatcher, SourceMatcher};
use crate::domain::strategy::{BinderStrategy, StrategyError};

use super::{env_name, require_str};

pub struct FunctionInvokeStrategy;

impl BinderStrategy for FunctionInvokeStrategy {
    fn name(&self) -> &str {
        "function-invoke"
    }

    fn matcher(&self) -> PairMatcher {
        PairMatcher::new(
            SourceMatcher::Group(SourceGroup::Compute),
            CapabilityMatcher::Kind(CapabilityKind::Compute),
        )
    }

    fn bind(&self, context: &BindingContext) -> Result<BindingResult, StrategyError> {
        let function_name = require_str(context, "functionName")?;
        let function_arn = require_str(context, "functionArn")?;

        // `read` only inspects the function; anything that writes may invoke it.
        let actions: Vec<&str> = match context.access() {
            AccessMode::Read => vec!["lambda:GetFunction"],
            AccessMode::Write | AccessMode::ReadWrite => vec!["lambda:InvokeFunction"],
            AccessMode::Admin => vec![
                "lambda:InvokeFunction",
                "lambda:GetFunction",
                "lambda:UpdateFunctionConfiguration",
            ],
        };

        Ok(BindingResult::new()
            .with_env(env_name(context, "FUNCTION_NAME"), function_name)
            .with_env(env_name(context, "FUNCTION_ARN"), function_arn)
            .with_statement(AccessStatement::allow(
                actions,
                [function_arn.to_string(), format!("{}:*", function_arn)],
            )))
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
    fn test_invoke_grant() {
        let ctx = context(
            SourceType::ComputeContainer,
            "thumbnailer",
            CapabilityPayload::new("compute:lambda")
                .with_attribute("functionName", "thumbnailer")
                .with_attribute("functionArn", "arn:aws:lambda:eu-west-1:123:function:thumbnailer"),
            AccessMode::Write,
            ComplianceTier::Baseline,
        );
        let result = FunctionInvokeStrategy.bind(&ctx).unwrap();

        assert_eq!(result.access_statements[0].actions, vec!["lambda:InvokeFunction"]);
        assert_eq!(result.access_statements[0].resources.len(), 2);
        assert_eq!(result.environment_variables["THUMBNAILER_FUNCTION_NAME"], "thumbnailer");
        assert!(result.network_rules.is_empty());
    }

    #[test]
    fn test_missing_arn() {
        let ctx = context(
            SourceType::Worker,
            "thumbnailer",
            CapabilityPayload::new("compute:lambda").with_attribute("functionName", "thumbnailer"),
            AccessMode::Write,
            ComplianceTier::Baseline,
        );
        assert!(matches!(
            FunctionInvokeStrategy.bind(&ctx),
            Err(StrategyError::MissingAttribute { attribute, .. }) if attribute == "functionArn"
        ));
    }
}

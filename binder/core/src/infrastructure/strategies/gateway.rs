// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP API edges.
//!
//! [`GatewayIntegrationStrategy`] wires an API gateway to a backing function: the
//! grant is a resource policy on the function naming the gateway service as
//! principal. [`ApiInvokeStrategy`] covers the opposite direction, a compute
//! component calling an API.

use crate::domain::binding::{AccessStatement, BindingContext, BindingResult};
use crate::domain::capability::CapabilityKind;
use crate::domain::component::{SourceGroup, SourceType};
use crate::domain::matcher::{CapabilityMatcher, PairMatcher, SourceMatcher};
use crate::domain::strategy::{BinderStrategy, StrategyError};

use super::{env_name, optional_str, require_str};

const GATEWAY_PRINCIPAL: &str = "apigateway.amazonaws.com";

fn refuse(context: &BindingContext) -> StrategyError {
    StrategyError::UnsupportedAccess {
        capability: context.capability_id().clone(),
        access: context.access(),
    }
}

pub struct GatewayIntegrationStrategy;

impl BinderStrategy for GatewayIntegrationStrategy {
    fn name(&self) -> &str {
        "gateway-integration"
    }

    fn matcher(&self) -> PairMatcher {
        PairMatcher::new(
            SourceMatcher::Exact(SourceType::ApiGateway),
            CapabilityMatcher::Kind(CapabilityKind::Compute),
        )
    }

    fn bind(&self, context: &BindingContext) -> Result<BindingResult, StrategyError> {
        // A gateway only ever invokes its backend.
        if !context.access().can_write() || context.access().is_admin() {
            return Err(refuse(context));
        }
        let function_arn = require_str(context, "functionArn")?;

        let mut grant = AccessStatement::grant_to(GATEWAY_PRINCIPAL, ["lambda:InvokeFunction"], function_arn);
        if let Some(api_arn) = optional_str(context, "sourceApiArn")? {
            grant.resources.push(format!("{}/*", api_arn));
        }
        Ok(BindingResult::new().with_statement(grant))
    }
}

pub struct ApiInvokeStrategy;

impl BinderStrategy for ApiInvokeStrategy {
    fn name(&self) -> &str {
        "api-invoke"
    }

    fn matcher(&self) -> PairMatcher {
        PairMatcher::new(
            SourceMatcher::Group(SourceGroup::Compute),
            CapabilityMatcher::Kind(CapabilityKind::Api),
        )
    }

    fn bind(&self, context: &BindingContext) -> Result<BindingResult, StrategyError> {
        if context.access().is_admin() {
            return Err(refuse(context));
        }
        let api_url = require_str(context, "apiUrl")?;

        let mut result = BindingResult::new().with_env(env_name(context, "URL"), api_url);
        // Without an ARN the API is public and needs no grant.
        if let Some(api_arn) = optional_str(context, "apiArn")? {
            result = result.with_statement(AccessStatement::allow(["execute-api:Invoke"], [format!("{}/*", api_arn)]));
        }
        Ok(result)
    }
}

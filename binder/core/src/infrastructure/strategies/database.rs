// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Compute → relational database.
//!
//! Payload attributes:
//!
//! | Attribute | Required | Use |
//! |-----------|----------|-----|
//! | `host` | yes | `<TARGET>_HOST` |
//! | `port` | yes | `<TARGET>_PORT`, network rules |
//! | `resourceArn` | yes | resource of the connect statement |
//! | `databaseName` | no | `<TARGET>_NAME` |
//! | `secretArn` | no | `<TARGET>_SECRET_ARN` plus a read grant on the credentials |

use tracing::debug;

use crate::domain::binding::{AccessMode, AccessStatement, BindingContext, BindingResult, NetworkRule};
use crate::domain::capability::CapabilityKind;
use crate::domain::component::SourceGroup;
use crate::domain::matcher::{CapabilityMatcher, PairMatcher, SourceMatcher};
use crate::domain::strategy::{BinderStrategy, StrategyError};

use super::{env_name, optional_str, require_port, require_str};

pub struct DatabaseStrategy;

impl DatabaseStrategy {
    fn actions(access: AccessMode) -> Vec<&'static str> {
        let mut actions = vec!["rds-db:connect"];
        if access.is_admin() {
            actions.extend(["rds:DescribeDBInstances", "rds:ModifyDBInstance", "rds:RebootDBInstance"]);
        }
        actions
    }

    /// Database role the connection assumes.
    fn role(access: AccessMode) -> &'static str {
        match access {
            AccessMode::Read => "readonly",
            AccessMode::Write | AccessMode::ReadWrite => "readwrite",
            AccessMode::Admin => "owner",
        }
    }
}

impl BinderStrategy for DatabaseStrategy {
    fn name(&self) -> &str {
        "database"
    }

    fn matcher(&self) -> PairMatcher {
        PairMatcher::new(
            SourceMatcher::Group(SourceGroup::Compute),
            CapabilityMatcher::Kind(CapabilityKind::Database),
        )
    }

    fn bind(&self, context: &BindingContext) -> Result<BindingResult, StrategyError> {
        let host = require_str(context, "host")?;
        let port = require_port(context, "port")?;
        let resource_arn = require_str(context, "resourceArn")?;
        let access = context.access();
        let target = context.target_component_id();
        let source = context.source_component_id();

        let mut result = BindingResult::new()
            .with_env(env_name(context, "HOST"), host)
            .with_env(env_name(context, "PORT"), port.to_string())
            .with_env(env_name(context, "ROLE"), Self::role(access))
            .with_statement(AccessStatement::allow(Self::actions(access), [resource_arn]))
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

        if let Some(engine) = context.capability_id().name() {
            result = result.with_env(env_name(context, "ENGINE"), engine);
        }
        if let Some(database) = optional_str(context, "databaseName")? {
            result = result.with_env(env_name(context, "NAME"), database);
        }
        if let Some(secret_arn) = optional_str(context, "secretArn")? {
            result = result
                .with_env(env_name(context, "SECRET_ARN"), secret_arn)
                .with_statement(AccessStatement::allow(
                    ["secretsmanager:GetSecretValue", "secretsmanager:DescribeSecret"],
                    [secret_arn],
                ));
        }

        debug!(subject = %context.subject(), role = Self::role(access), "Database binding computed");
        Ok(result)
    }
}

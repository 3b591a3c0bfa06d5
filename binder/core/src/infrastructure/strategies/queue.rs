// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Compute → message queue or pub/sub topic.
//!
//! Queues need `queueUrl` and `queueArn`; readers consume, writers send. Topics need
//! `topicArn` and only support publishing: subscribers bind to a queue subscribed to
//! the topic instead, so `read` on a topic is refused.

use crate::domain::binding::{AccessMode, AccessStatement, BindingContext, BindingResult};
use crate::domain::capability::CapabilityKind;
use crate::domain::component::SourceGroup;
use crate::domain::matcher::{CapabilityMatcher, PairMatcher, SourceMatcher};
use crate::domain::strategy::{BinderStrategy, StrategyError};

use super::{env_name, optional_str, require_str};

pub struct QueueStrategy;

impl QueueStrategy {
    fn bind_queue(context: &BindingContext) -> Result<BindingResult, StrategyError> {
        let queue_url = require_str(context, "queueUrl")?;
        let queue_arn = require_str(context, "queueArn")?;
        let access = context.access();

        let actions: Vec<&str> = match access {
            AccessMode::Admin => vec!["sqs:*"],
            _ => {
                let mut actions = vec!["sqs:GetQueueAttributes"];
                if access.can_read() {
                    actions.extend(["sqs:ReceiveMessage", "sqs:DeleteMessage", "sqs:ChangeMessageVisibility"]);
                }
                if access.can_write() {
                    actions.push("sqs:SendMessage");
                }
                actions
            }
        };

        let result = BindingResult::new()
            .with_env(env_name(context, "QUEUE_URL"), queue_url)
            .with_env(env_name(context, "QUEUE_ARN"), queue_arn)
            .with_statement(AccessStatement::allow(actions, [queue_arn]));
        Self::with_key_grant(context, result)
    }

    fn bind_topic(context: &BindingContext) -> Result<BindingResult, StrategyError> {
        let access = context.access();
        if access.can_read() && !access.is_admin() {
            return Err(StrategyError::UnsupportedAccess {
                capability: context.capability_id().clone(),
                access,
            });
        }
        let topic_arn = require_str(context, "topicArn")?;
        let actions: Vec<&str> = if access.is_admin() { vec!["sns:*"] } else { vec!["sns:Publish"] };

        let result = BindingResult::new()
            .with_env(env_name(context, "TOPIC_ARN"), topic_arn)
            .with_statement(AccessStatement::allow(actions, [topic_arn]));
        Self::with_key_grant(context, result)
    }

    fn with_key_grant(context: &BindingContext, result: BindingResult) -> Result<BindingResult, StrategyError> {
        let Some(key_arn) = optional_str(context, "kmsKeyArn")? else {
            return Ok(result);
        };
        let access = context.access();
        let mut actions = Vec::new();
        if access.can_read() {
            actions.push("kms:Decrypt");
        }
        if access.can_write() {
            actions.push("kms:GenerateDataKey");
        }
        Ok(result.with_statement(AccessStatement::allow(actions, [key_arn])))
    }
}

impl BinderStrategy for QueueStrategy {
    fn name(&self) -> &str {
        "queue"
    }

    fn matcher(&self) -> PairMatcher {
        PairMatcher::new(
            SourceMatcher::Group(SourceGroup::Compute),
            CapabilityMatcher::OneOf(vec![CapabilityKind::Queue, CapabilityKind::Topic]),
        )
    }

    fn bind(&self, context: &BindingContext) -> Result<BindingResult, StrategyError> {
        match context.capability_id().kind() {
            CapabilityKind::Topic => Self::bind_topic(context),
            _ => Self::bind_queue(context),
        }
    }
}

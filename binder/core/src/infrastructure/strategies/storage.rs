// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Compute → object storage bucket. Needs `bucketName` and `bucketArn`; an optional
//! `kmsKeyArn` adds the key grants matching the access mode.

use crate::domain::binding::{AccessMode, AccessStatement, BindingContext, BindingResult};
use crate::domain::capability::CapabilityKind;
use crate::domain::component::SourceGroup;
use crate::domain::matcher::{CapabilityMatcher, PairMatcher, SourceMatcher};
use crate::domain::strategy::{BinderStrategy, StrategyError};

use super::{env_name, optional_str, require_str};

const READ_ACTIONS: [&str; 3] = ["s3:GetObject", "s3:GetObjectVersion", "s3:ListBucket"];
const WRITE_ACTIONS: [&str; 3] = ["s3:PutObject", "s3:DeleteObject", "s3:AbortMultipartUpload"];

pub struct StorageStrategy;

fn actions(access: AccessMode) -> Vec<&'static str> {
    match access {
        AccessMode::Admin => vec!["s3:*"],
        _ => {
            let mut actions = Vec::new();
            if access.can_read() {
                actions.extend(READ_ACTIONS);
            }
            if access.can_write() {
                actions.extend(WRITE_ACTIONS);
            }
            actions
        }
    }
}

fn key_actions(access: AccessMode) -> Vec<&'static str> {
    let mut actions = Vec::new();
    if access.can_read() {
        actions.push("kms:Decrypt");
    }
    if access.can_write() {
        actions.push("kms:GenerateDataKey");
    }
    actions
}

impl BinderStrategy for StorageStrategy {
    fn name(&self) -> &str {
        "object-storage"
    }

    fn matcher(&self) -> PairMatcher {
        PairMatcher::new(
            SourceMatcher::Group(SourceGroup::Compute),
            CapabilityMatcher::Kind(CapabilityKind::Storage),
        )
    }

    fn bind(&self, context: &BindingContext) -> Result<BindingResult, StrategyError> {
        let bucket_name = require_str(context, "bucketName")?;
        let bucket_arn = require_str(context, "bucketArn")?;
        let access = context.access();

        let mut result = BindingResult::new()
            .with_env(env_name(context, "BUCKET_NAME"), bucket_name)
            .with_env(env_name(context, "BUCKET_ARN"), bucket_arn)
            .with_statement(AccessStatement::allow(
                actions(access),
                [bucket_arn.to_string(), format!("{}/*", bucket_arn)],
            ));

        if let Some(key_arn) = optional_str(context, "kmsKeyArn")? {
            result = result.with_statement(AccessStatement::allow(key_actions(access), [key_arn]));
        }
        Ok(result)
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod cache;
pub mod manifest_parser;
pub mod metrics;
pub mod strategies;

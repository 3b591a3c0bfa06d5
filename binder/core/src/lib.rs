// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Capability binding resolution engine.
//!
//! # Architecture
//!
//! - **domain:** capabilities, binding contexts and results, compliance rules,
//!   the strategy contract, manifests and engine configuration
//! - **application:** the binder registry, compliance enforcer and synthesis driver
//! - **infrastructure:** binding cache, audit metrics, built-in strategies, YAML parsing

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;

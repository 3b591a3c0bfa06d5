// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer
//!
//! Value objects and contracts of the binding engine. Nothing here performs I/O
//! except [`engine_config`], which loads YAML configuration from disk.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`capability`] | `CapabilityId`, `CapabilityKind`, `CapabilityPayload`, `CapabilityDirectory` |
//! | [`component`] | `ComponentId`, `SourceType`, `SourceGroup` |
//! | [`binding`] | `BindingDirective`, `BindingContext`, `BindingResult` and its parts |
//! | [`matcher`] | Source/capability matchers with specificity ranks |
//! | [`compliance`] | `ComplianceRule`, `Violation`, `ComplianceSettings` |
//! | [`strategy`] | `BinderStrategy` trait, `StrategyTable` |
//! | [`error`] | `BindingError` taxonomy |
//! | [`events`] | Audit events |
//! | [`manifest`] | `ServiceManifest` |
//! | [`engine_config`] | `EngineConfigManifest` and discovery |

pub mod binding;
pub mod capability;
pub mod compliance;
pub mod component;
pub mod engine_config;
pub mod error;
pub mod events;
pub mod manifest;
pub mod matcher;
pub mod strategy;

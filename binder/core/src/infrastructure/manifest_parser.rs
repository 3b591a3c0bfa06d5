// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Service Manifest YAML Parser
//!
//! Parses `ServiceManifest` YAML documents into domain objects and validates them.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external YAML → Domain objects
//! - **Anti-Corruption:** Translates YAML schema to domain model

use crate::domain::manifest::ServiceManifest;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

pub struct ServiceManifestParser;

impl ServiceManifestParser {
    /// Parse service manifest from YAML string
    pub fn parse_yaml(yaml: &str) -> Result<ServiceManifest> {
        let manifest: ServiceManifest = serde_yaml::from_str(yaml).context("Failed to parse YAML manifest")?;

        manifest
            .validate()
            .map_err(|e| anyhow!("Manifest validation failed: {}", e))?;

        Ok(manifest)
    }

    /// Parse service manifest from YAML file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ServiceManifest> {
        let yaml = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read manifest file: {:?}", path.as_ref()))?;

        Self::parse_yaml(&yaml)
    }

    /// Serialize service manifest to YAML string
    pub fn to_yaml(manifest: &ServiceManifest) -> Result<String> {
        serde_yaml::to_string(manifest).context("Failed to serialize manifest to YAML")
    }
}

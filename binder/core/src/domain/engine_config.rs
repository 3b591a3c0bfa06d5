// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Engine Configuration Types
//
// Defines the configuration schema for the binding engine, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Synthesis defaults (environment, compliance tier)
// - Central per-tier compliance thresholds
// - Observability auto-injection
// - Logging settings

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::binding::{AccessMode, ComplianceTier};
use super::capability::{CapabilityId, CapabilityPayload};
use super::compliance::ComplianceSettings;
use super::component::ComponentId;

pub const CONFIG_API_VERSION: &str = "capbind.dev/v1";
pub const ENGINE_CONFIG_KIND: &str = "EngineConfig";

/// Top-level Kubernetes-style engine configuration manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfigManifest {
    /// API version (must be "capbind.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "EngineConfig")
    pub kind: String,

    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: EngineConfigSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfigSpec {
    #[serde(default)]
    pub synthesis: SynthesisDefaults,

    #[serde(default)]
    pub compliance: ComplianceSettings,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisDefaults {
    /// Environment name used when the manifest does not set one
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Compliance tier used when the manifest does not set one
    #[serde(default)]
    pub compliance_tier: ComplianceTier,
}

impl Default for SynthesisDefaults {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            compliance_tier: ComplianceTier::default(),
        }
    }
}

/// Telemetry wiring bound to every compute component by the synthesis driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_true")]
    pub inject: bool,

    /// Platform component that provides the telemetry capability
    #[serde(default = "default_telemetry_component")]
    pub provider_component: ComponentId,

    #[serde(default = "default_telemetry_capability")]
    pub capability: CapabilityId,

    #[serde(default = "default_collector_endpoint")]
    pub collector_endpoint: String,

    /// Log group / dataset the collector forwards into
    #[serde(default = "default_log_destination")]
    pub log_destination: String,
}

impl ObservabilityConfig {
    /// Payload the driver registers for [`Self::provider_component`].
    pub fn payload(&self) -> CapabilityPayload {
        CapabilityPayload::new(self.capability.clone())
            .with_attribute("collectorEndpoint", self.collector_endpoint.as_str())
            .with_attribute("logDestination", self.log_destination.as_str())
    }

    /// Access mode of injected directives (telemetry is emitted, never read back).
    pub fn access(&self) -> AccessMode {
        AccessMode::Write
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            inject: true,
            provider_component: default_telemetry_component(),
            capability: default_telemetry_capability(),
            collector_endpoint: default_collector_endpoint(),
            log_destination: default_log_destination(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_telemetry_component() -> ComponentId {
    ComponentId::new("platform-telemetry")
}

fn default_telemetry_capability() -> CapabilityId {
    CapabilityId::new("observability:otel")
}

fn default_collector_endpoint() -> String {
    "http://otel-collector.platform.internal:4317".to_string()
}

fn default_log_destination() -> String {
    "/platform/services".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for EngineConfigManifest {
    fn default() -> Self {
        Self {
            api_version: CONFIG_API_VERSION.to_string(),
            kind: ENGINE_CONFIG_KIND.to_string(),
            metadata: ConfigMetadata {
                name: "default".to_string(),
                version: Some("1.0.0".to_string()),
            },
            spec: EngineConfigSpec::default(),
        }
    }
}

/// Where the effective engine configuration was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Path given with `--config` or `CAPBIND_CONFIG_PATH`.
    Explicit(PathBuf),
    /// First existing file in the discovery order.
    Discovered(PathBuf),
    /// No file found; built-in defaults.
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::Discovered(path) => Some(path),
            Self::Defaults => None,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(path) => write!(f, "{} (explicit)", path.display()),
            Self::Discovered(path) => write!(f, "{} (discovered)", path.display()),
            Self::Defaults => write!(f, "built-in defaults"),
        }
    }
}

impl EngineConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config {:?}", path))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to load engine config {:?}", path))
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize engine config")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write engine config {:?}", path))?;
        Ok(())
    }

    /// Parse configuration from YAML string. The header must name an `EngineConfig`
    /// so that a service manifest passed as `--config` is rejected up front.
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).context("Failed to parse engine config YAML")?;
        if config.kind != ENGINE_CONFIG_KIND {
            anyhow::bail!(
                "Expected kind '{}' but found '{}'",
                ENGINE_CONFIG_KIND,
                config.kind
            );
        }
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. ./capbind-config.yaml (working directory)
    /// 2. ~/.capbind/config.yaml (user home)
    /// 3. /etc/capbind/config.yaml (system, Unix) or C:\ProgramData\Capbind\config.yaml (Windows)
    ///
    /// `CAPBIND_CONFIG_PATH` is not a discovery location; [`Self::load_with_source`]
    /// treats it as an explicit path.
    pub fn discover_config() -> Option<PathBuf> {
        Self::discovery_paths().into_iter().find(|path| path.exists())
    }

    /// Candidate paths checked by [`Self::discover_config`], in order.
    pub fn discovery_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./capbind-config.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".capbind").join("config.yaml"));
        }
        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/capbind/config.yaml"));
        #[cfg(windows)]
        paths.push(PathBuf::from("C:\\ProgramData\\Capbind\\config.yaml"));
        paths
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        Self::load_with_source(cli_path).map(|(config, _)| config)
    }

    /// Load configuration and report where it came from. An explicit path (argument,
    /// then `CAPBIND_CONFIG_PATH`) must exist and parse; a discovered file that fails
    /// to parse is an error as well. The `CAPBIND_*` overrides are applied last.
    pub fn load_with_source(cli_path: Option<PathBuf>) -> anyhow::Result<(Self, ConfigSource)> {
        let explicit = cli_path.or_else(|| {
            std::env::var("CAPBIND_CONFIG_PATH")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        });
        let (mut config, source) = match explicit {
            Some(path) => {
                tracing::info!("Loading configuration from explicit path: {:?}", path);
                (Self::from_yaml_file(&path)?, ConfigSource::Explicit(path))
            }
            None => match Self::discover_config() {
                Some(path) => {
                    tracing::info!("Loading configuration from discovered path: {:?}", path);
                    (Self::from_yaml_file(&path)?, ConfigSource::Discovered(path))
                }
                None => {
                    tracing::debug!("No configuration file found in standard locations. Using defaults.");
                    (Self::default(), ConfigSource::Defaults)
                }
            },
        };
        config.apply_env_overrides();
        Ok((config, source))
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CAPBIND_ENVIRONMENT") {
            if val.trim().is_empty() {
                tracing::warn!("Ignoring empty CAPBIND_ENVIRONMENT override");
            } else {
                tracing::info!("Environment override: CAPBIND_ENVIRONMENT={}", val);
                self.spec.synthesis.environment = val;
            }
        }

        if let Ok(val) = std::env::var("CAPBIND_COMPLIANCE_TIER") {
            match val.parse::<ComplianceTier>() {
                Ok(tier) => {
                    tracing::info!("Environment override: CAPBIND_COMPLIANCE_TIER={}", tier);
                    self.spec.synthesis.compliance_tier = tier;
                }
                Err(e) => {
                    tracing::warn!("Invalid value for CAPBIND_COMPLIANCE_TIER: {}. Ignoring.", e);
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != CONFIG_API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                CONFIG_API_VERSION
            );
        }

        if self.kind != ENGINE_CONFIG_KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, ENGINE_CONFIG_KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.synthesis.environment.trim().is_empty() {
            anyhow::bail!("spec.synthesis.environment cannot be empty");
        }

        self.spec.compliance.validate()?;

        let observability = &self.spec.observability;
        if observability.inject {
            if observability.provider_component.as_str().is_empty() {
                anyhow::bail!("spec.observability.provider_component cannot be empty");
            }
            if observability.capability.name().is_none() {
                anyhow::bail!(
                    "spec.observability.capability must be of the form namespace:name (got '{}')",
                    observability.capability
                );
            }
            if observability.collector_endpoint.is_empty() {
                anyhow::bail!("spec.observability.collector_endpoint cannot be empty");
            }
        }

        match self.spec.logging.format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("spec.logging.format must be 'json' or 'text' (got '{}')", other),
        }

        Ok(())
    }
}

//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use anyhow::{Context, Result};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

use super::{defaults, paths, schema::Config};
use crate::logscan::{MatchFlags, ScanPatterns};
use crate::readiness::ProgressParser;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Explicit `--config` file
    /// 3. Project file (`./stevedore.yaml`)
    /// 4. Root config
    /// 5. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let mut layers = Vec::new();
        for path in [paths::root_config_path(), paths::project_config_path()] {
            if path.exists() {
                layers.push(path);
            }
        }
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
            }
            layers.push(path.to_path_buf());
        }

        let config = Self::load_layers(&layers)?;
        Ok(Self::apply_env_overrides(config, |key| std::env::var(key).ok()))
    }

    /// Merge the given files over the defaults, later files winning
    pub fn load_layers(layers: &[PathBuf]) -> Result<Config> {
        let mut merged = serde_yaml::to_value(Self::load_defaults())
            .context("Failed to serialize default configuration")?;

        for path in layers {
            tracing::debug!("Loading config layer {}", path.display());
            let layer = Self::load_value(path)?;
            merge_values(&mut merged, layer);
        }

        serde_yaml::from_value(merged).context("Failed to build merged configuration")
    }

    /// Load configuration from a single file
    pub fn load_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn load_value(path: &Path) -> Result<Value> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // Parse through the schema first so unknown types fail with a file-specific message
        let _: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        let value: Value = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        // An empty file parses as null
        Ok(if value.is_null() {
            Value::Mapping(Default::default())
        } else {
            value
        })
    }

    /// Validate configuration by loading it and compiling every pattern
    ///
    /// This fails on:
    /// - Invalid YAML syntax or value types
    /// - An unusable readiness step pattern or empty finish marker
    /// - A zero readiness poll interval
    /// - An empty or invalid log scan trigger/exception set
    pub fn validate(explicit: Option<&Path>) -> Result<Config> {
        let config = Self::load(explicit).context("Failed to load merged configuration")?;
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Check an already merged configuration
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.readiness.interval_seconds == 0 {
            return Err(anyhow::anyhow!(
                "Invalid readiness configuration: intervalSeconds must be at least 1"
            ));
        }

        ProgressParser::new(
            config.readiness.finish_marker.clone(),
            &config.readiness.step_pattern,
        )
        .context("Invalid readiness configuration")?;

        let flags = MatchFlags {
            case_insensitive: config.log_scan.case_insensitive,
            literal: config.log_scan.literal,
        };
        ScanPatterns::new(&config.log_scan.triggers, &config.log_scan.exceptions, flags)
            .context("Invalid logScan configuration")?;
        for (kind, extra) in &config.log_scan.sources {
            let triggers: Vec<String> = config
                .log_scan
                .triggers
                .iter()
                .chain(&extra.triggers)
                .cloned()
                .collect();
            let exceptions: Vec<String> = config
                .log_scan
                .exceptions
                .iter()
                .chain(&extra.exceptions)
                .cloned()
                .collect();
            ScanPatterns::new(&triggers, &exceptions, flags)
                .with_context(|| format!("Invalid logScan.sources.{} configuration", kind))?;
        }

        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Apply environment variable overrides
    fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        // STEVEDORE_DOCKER_BINARY override
        if let Some(docker) = lookup("STEVEDORE_DOCKER_BINARY") {
            config.docker_binary = docker;
        }

        // STEVEDORE_KUBECTL_BINARY override
        if let Some(kubectl) = lookup("STEVEDORE_KUBECTL_BINARY") {
            config.kubectl_binary = kubectl;
        }

        // STEVEDORE_FINISH_MARKER override
        if let Some(marker) = lookup("STEVEDORE_FINISH_MARKER") {
            config.readiness.finish_marker = marker;
        }

        // STEVEDORE_MAX_CYCLES override
        if let Some(max_cycles) = lookup("STEVEDORE_MAX_CYCLES") {
            match max_cycles.parse::<u32>() {
                Ok(val) => config.readiness.max_cycles = val,
                Err(_) => tracing::warn!("Ignoring invalid STEVEDORE_MAX_CYCLES={}", max_cycles),
            }
        }

        config
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Save root configuration
    pub fn save_root(config: &Config) -> Result<()> {
        Self::save(config, &paths::root_config_path())
    }
}

/// Recursively merge `overlay` into `base`; mappings merge key by key, anything else replaces
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

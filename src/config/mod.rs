//! Configuration system for stevedore
//!
//! Settings are layered: built-in defaults, the root config file, the project
//! file in the working directory, an explicit `--config` file and finally
//! environment overrides.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use defaults::sample_config;
pub use loader::ConfigLoader;
pub use schema::Config;

use anyhow::Context;

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &schema::Config, key: &str) -> anyhow::Result<String> {
    match key {
        "dockerBinary" => Ok(config.docker_binary.clone()),
        "kubectlBinary" => Ok(config.kubectl_binary.clone()),
        "local.services" => Ok(config.local.services.join(",")),
        "kubernetes.deployments" => serde_yaml::to_string(&config.kubernetes.deployments)
            .map_err(|e| anyhow::anyhow!("Failed to serialize kubernetes.deployments: {}", e)),
        "readiness.finishMarker" => Ok(config.readiness.finish_marker.clone()),
        "readiness.stepPattern" => Ok(config.readiness.step_pattern.clone()),
        "readiness.intervalSeconds" => Ok(config.readiness.interval_seconds.to_string()),
        "readiness.maxCycles" => Ok(config.readiness.max_cycles.to_string()),
        "logScan.triggers" => Ok(config.log_scan.triggers.join(",")),
        "logScan.exceptions" => Ok(config.log_scan.exceptions.join(",")),
        "logScan.caseInsensitive" => Ok(config.log_scan.case_insensitive.to_string()),
        "logScan.literal" => Ok(config.log_scan.literal.to_string()),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
pub fn set_config_value(config: &mut schema::Config, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "dockerBinary" => {
            config.docker_binary = value.to_string();
        }
        "kubectlBinary" => {
            config.kubectl_binary = value.to_string();
        }
        "local.services" => {
            config.local.services = parse_list(key, value)?;
        }
        "kubernetes.deployments" => {
            config.kubernetes.deployments = serde_yaml::from_str(value).context(
                "kubernetes.deployments must be a YAML list (e.g., [{name: web, namespaces: [staging]}])",
            )?;
        }
        "readiness.finishMarker" => {
            if value.is_empty() {
                return Err(anyhow::anyhow!("readiness.finishMarker must not be empty"));
            }
            config.readiness.finish_marker = value.to_string();
        }
        "readiness.stepPattern" => {
            config.readiness.step_pattern = value.to_string();
        }
        "readiness.intervalSeconds" => {
            config.readiness.interval_seconds = value
                .parse()
                .context("readiness.intervalSeconds must be a number")?;
        }
        "readiness.maxCycles" => {
            config.readiness.max_cycles = value
                .parse()
                .context("readiness.maxCycles must be a number")?;
        }
        "logScan.triggers" => {
            let triggers = parse_list(key, value)?;
            if triggers.is_empty() {
                return Err(anyhow::anyhow!("logScan.triggers needs at least one entry"));
            }
            config.log_scan.triggers = triggers;
        }
        "logScan.exceptions" => {
            config.log_scan.exceptions = parse_list(key, value)?;
        }
        "logScan.caseInsensitive" => {
            config.log_scan.case_insensitive = value
                .parse()
                .context("logScan.caseInsensitive must be 'true' or 'false'")?;
        }
        "logScan.literal" => {
            config.log_scan.literal = value
                .parse()
                .context("logScan.literal must be 'true' or 'false'")?;
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    Ok(())
}

/// Parse a YAML array or a comma-separated list
fn parse_list(key: &str, value: &str) -> anyhow::Result<Vec<String>> {
    if value.trim_start().starts_with('[') {
        serde_yaml::from_str(value)
            .with_context(|| format!("{} must be a YAML array (e.g., ['a', 'b'])", key))
    } else {
        Ok(value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::readiness::DEFAULT_STEP_PATTERN;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Local container engine binary
    #[serde(default = "default_docker_binary")]
    pub docker_binary: String,

    /// Kubernetes CLI binary
    #[serde(default = "default_kubectl_binary")]
    pub kubectl_binary: String,

    /// Services discovered on the local engine
    #[serde(default)]
    pub local: LocalConfig,

    /// Deployments discovered on Kubernetes
    #[serde(default)]
    pub kubernetes: KubernetesConfig,

    /// Readiness polling
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Log error scanning
    #[serde(default)]
    pub log_scan: LogScanConfig,
}

/// Local backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalConfig {
    /// Container names to inspect
    #[serde(default)]
    pub services: Vec<String>,
}

/// Kubernetes backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesConfig {
    #[serde(default)]
    pub deployments: Vec<DeploymentTarget>,
}

/// A Deployment and the namespaces it is rolled out to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTarget {
    pub name: String,

    /// Target namespaces; empty means "the namespace given on the command line"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
}

/// Readiness polling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessConfig {
    /// Literal log text announcing that the deployment finished
    #[serde(default = "default_finish_marker")]
    pub finish_marker: String,

    /// Regex with `step` and `label` named groups
    #[serde(default = "default_step_pattern")]
    pub step_pattern: String,

    /// Seconds between log samples
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,

    /// Log samples before giving up
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u32,
}

/// Log scanning configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogScanConfig {
    /// Strings that mark a line as an error
    #[serde(default = "default_triggers")]
    pub triggers: Vec<String>,

    /// Strings that clear a triggered line
    #[serde(default)]
    pub exceptions: Vec<String>,

    #[serde(default = "default_true")]
    pub case_insensitive: bool,

    /// Match strings literally instead of as regular expressions
    #[serde(default = "default_true")]
    pub literal: bool,

    /// Extra strings per log source kind (`local`, `kubernetes`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: BTreeMap<String, SourcePatterns>,
}

/// Extra trigger and exception strings for one log source kind
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourcePatterns {
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub exceptions: Vec<String>,
}

// Default value functions
fn default_docker_binary() -> String {
    "docker".to_string()
}

fn default_kubectl_binary() -> String {
    "kubectl".to_string()
}

fn default_finish_marker() -> String {
    "Deployment complete".to_string()
}

fn default_step_pattern() -> String {
    DEFAULT_STEP_PATTERN.to_string()
}

fn default_interval_seconds() -> u64 {
    2
}

fn default_max_cycles() -> u32 {
    300
}

fn default_triggers() -> Vec<String> {
    ["error", "exception", "fatal", "panic"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docker_binary: default_docker_binary(),
            kubectl_binary: default_kubectl_binary(),
            local: LocalConfig::default(),
            kubernetes: KubernetesConfig::default(),
            readiness: ReadinessConfig::default(),
            log_scan: LogScanConfig::default(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            finish_marker: default_finish_marker(),
            step_pattern: default_step_pattern(),
            interval_seconds: default_interval_seconds(),
            max_cycles: default_max_cycles(),
        }
    }
}

impl Default for LogScanConfig {
    fn default() -> Self {
        Self {
            triggers: default_triggers(),
            exceptions: Vec::new(),
            case_insensitive: default_true(),
            literal: default_true(),
            sources: BTreeMap::new(),
        }
    }
}

//! Default configuration values
//!
//! Provides default configuration instances and helper functions.

use super::schema::{Config, DeploymentTarget};

/// Get the default configuration
pub fn default_config() -> Config {
    Config::default()
}

/// Starter configuration written by `config init`
pub fn sample_config() -> Config {
    let mut config = default_config();
    config.local.services = vec!["app".to_string()];
    config.kubernetes.deployments = vec![DeploymentTarget {
        name: "app".to_string(),
        namespaces: Vec::new(),
    }];
    config
}

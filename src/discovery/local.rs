//! Local container engine discovery

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::{DiscoveryError, DiscoveryProvider};
use crate::config::schema::LocalConfig;
use crate::exec::{CommandRunner, display_command};
use crate::models::{Environment, Workload};

/// Subset of `docker inspect` output used to build a workload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerInspect {
    created: String,
    #[serde(default)]
    state: ContainerState,
    #[serde(default)]
    config: ContainerConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerState {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerConfig {
    #[serde(default)]
    image: String,
}

/// Discovers configured services on the local engine via `docker inspect`
pub struct LocalProvider {
    runner: Arc<dyn CommandRunner>,
    docker: String,
    config: LocalConfig,
}

impl LocalProvider {
    pub fn new(runner: Arc<dyn CommandRunner>, docker: impl Into<String>, config: LocalConfig) -> Self {
        Self {
            runner,
            docker: docker.into(),
            config,
        }
    }

    async fn inspect(&self, service: &str) -> Result<Option<Workload>, DiscoveryError> {
        let argv = vec![
            self.docker.clone(),
            "inspect".to_string(),
            "--format".to_string(),
            "json".to_string(),
            service.to_string(),
        ];
        let command = display_command(&argv);
        let output = self.runner.run(&argv).await?;

        let Some(container) = parse_inspect_output(&command, &output.stdout)?.into_iter().next()
        else {
            tracing::debug!("No container found for service {}", service);
            return Ok(None);
        };

        let created_at = parse_engine_timestamp(&container.created)?;
        Ok(Some(Workload::container(
            &self.docker,
            service,
            container.config.image,
            container.state.status,
            created_at,
        )))
    }
}

#[async_trait]
impl DiscoveryProvider for LocalProvider {
    async fn discover(&self, env: &Environment) -> Result<Vec<Workload>, DiscoveryError> {
        if !env.is_local() {
            return Ok(Vec::new());
        }

        let mut workloads = Vec::new();
        for service in &self.config.services {
            if let Some(workload) = self.inspect(service).await? {
                workloads.push(workload);
            }
        }
        Ok(workloads)
    }
}

/// Parse `docker inspect --format json` output.
///
/// Depending on the engine version this is either a JSON array or one JSON
/// object per line.
fn parse_inspect_output(command: &str, stdout: &str) -> Result<Vec<ContainerInspect>, DiscoveryError> {
    let parse_error = |e: serde_json::Error| DiscoveryError::Parse {
        command: command.to_string(),
        reason: e.to_string(),
    };

    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(parse_error);
    }
    trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(parse_error))
        .collect()
}

/// Drop the fractional-seconds part of an RFC3339 timestamp.
///
/// The engine reports nanosecond precision; the workload model keeps whole seconds.
pub fn strip_fractional_seconds(timestamp: &str) -> String {
    let Some(t_pos) = timestamp.find('T') else {
        return timestamp.to_string();
    };
    let Some(dot) = timestamp[t_pos..].find('.').map(|offset| t_pos + offset) else {
        return timestamp.to_string();
    };
    let digits = timestamp[dot + 1..]
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    format!("{}{}", &timestamp[..dot], &timestamp[dot + 1 + digits..])
}

/// Parse a local-engine creation timestamp into UTC
pub fn parse_engine_timestamp(raw: &str) -> Result<DateTime<Utc>, DiscoveryError> {
    let normalized = strip_fractional_seconds(raw.trim());
    DateTime::parse_from_rfc3339(&normalized)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| DiscoveryError::Timestamp {
            value: raw.to_string(),
            source,
        })
}

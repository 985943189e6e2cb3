//! Pod detail extraction from `kubectl get pods <name> -o json`

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;

use crate::discovery::DiscoveryError;

/// Phase reported when the pod has no status yet
pub const UNKNOWN_PHASE: &str = "Unknown";

/// Fields of a pod needed to build a workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodDetails {
    pub name: String,
    pub image: String,
    pub phase: String,
    pub created_at: DateTime<Utc>,
}

/// Parse the JSON document of a single pod.
///
/// The running image comes from the first container status and falls back to
/// the first container in the spec when the pod has not started yet.
pub fn parse_pod_details(command: &str, json: &str) -> Result<PodDetails, DiscoveryError> {
    let pod: Pod = serde_json::from_str(json).map_err(|e| DiscoveryError::Parse {
        command: command.to_string(),
        reason: e.to_string(),
    })?;

    let name = pod.metadata.name.clone().ok_or_else(|| DiscoveryError::Parse {
        command: command.to_string(),
        reason: "pod has no metadata.name".to_string(),
    })?;

    let status = pod.status.as_ref();
    let phase = status
        .and_then(|s| s.phase.clone())
        .unwrap_or_else(|| UNKNOWN_PHASE.to_string());

    let image = status
        .and_then(|s| s.container_statuses.as_ref())
        .and_then(|statuses| statuses.first())
        .map(|cs| cs.image.clone())
        .filter(|image| !image.is_empty())
        .or_else(|| {
            pod.spec
                .as_ref()
                .and_then(|spec| spec.containers.first())
                .and_then(|c| c.image.clone())
        })
        .unwrap_or_default();

    let created_at = creation_timestamp(command, &pod)?;

    Ok(PodDetails {
        name,
        image,
        phase,
        created_at,
    })
}

fn creation_timestamp(command: &str, pod: &Pod) -> Result<DateTime<Utc>, DiscoveryError> {
    let missing = || DiscoveryError::Parse {
        command: command.to_string(),
        reason: "pod has no metadata.creationTimestamp".to_string(),
    };
    let time = pod.metadata.creation_timestamp.as_ref().ok_or_else(missing)?;

    // Time serializes to its RFC3339 form
    let value = serde_json::to_value(time).map_err(|e| DiscoveryError::Parse {
        command: command.to_string(),
        reason: e.to_string(),
    })?;
    let raw = value.as_str().ok_or_else(missing)?;

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| DiscoveryError::Timestamp {
            value: raw.to_string(),
            source,
        })
}

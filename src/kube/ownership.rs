//! Deployment → ReplicaSet → Pod ownership resolution
//!
//! `kubectl describe deployment` only reports the active ReplicaSet in its
//! human-readable output, so the first step scrapes that text. The remaining
//! steps use jsonpath queries. Keep the scrape confined to
//! [`resolve_active_replica_sets`] so a structured source can replace it.

use std::sync::Arc;

use crate::discovery::DiscoveryError;
use crate::exec::CommandRunner;

/// Label printed by `kubectl describe deployment` for the active ReplicaSet
const NEW_REPLICA_SET_LABEL: &str = "NewReplicaSet:";

/// Whitespace-separated column holding the ReplicaSet name(s)
const NEW_REPLICA_SET_COLUMN: usize = 1;

/// Value printed when a Deployment has no active ReplicaSet
const NONE_VALUE: &str = "<none>";

/// Label tying pods to the ReplicaSet generation that created them
pub const POD_TEMPLATE_HASH_LABEL: &str = "pod-template-hash";

/// Extract active ReplicaSet names from `kubectl describe deployment` output.
///
/// A missing `NewReplicaSet:` line and `<none>` both mean no active
/// ReplicaSet. Comma-separated names are all kept, in order.
pub fn resolve_active_replica_sets(describe_text: &str) -> Vec<String> {
    let Some(line) = describe_text
        .lines()
        .map(str::trim_start)
        .find(|line| line.starts_with(NEW_REPLICA_SET_LABEL))
    else {
        return Vec::new();
    };

    match line.split_whitespace().nth(NEW_REPLICA_SET_COLUMN) {
        None | Some(NONE_VALUE) => Vec::new(),
        Some(column) => column
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != NONE_VALUE)
            .map(str::to_string)
            .collect(),
    }
}

/// Split a jsonpath `{.items[*].metadata.name}` result into names
pub fn split_names(jsonpath_output: &str) -> Vec<String> {
    jsonpath_output
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Pods owned by a Deployment, together with the ReplicaSets that own them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentOwnership {
    pub deployment: String,
    pub namespace: String,
    pub replica_sets: Vec<String>,
    pub pods: Vec<String>,
}

impl DeploymentOwnership {
    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }
}

/// Resolves ownership chains by invoking kubectl
#[derive(Clone)]
pub struct OwnershipResolver {
    runner: Arc<dyn CommandRunner>,
    kubectl: String,
}

impl OwnershipResolver {
    pub fn new(runner: Arc<dyn CommandRunner>, kubectl: impl Into<String>) -> Self {
        Self {
            runner,
            kubectl: kubectl.into(),
        }
    }

    async fn kubectl(&self, args: &[String]) -> Result<String, DiscoveryError> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(self.kubectl.clone());
        argv.extend_from_slice(args);
        let output = self.runner.run(&argv).await?;
        Ok(output.stdout)
    }

    /// Step 1: active ReplicaSets of a Deployment
    pub async fn active_replica_sets(
        &self,
        deployment: &str,
        namespace: &str,
    ) -> Result<Vec<String>, DiscoveryError> {
        let describe = self
            .kubectl(&[
                "describe".to_string(),
                format!("deployment/{}", deployment),
                format!("--namespace={}", namespace),
            ])
            .await?;
        let replica_sets = resolve_active_replica_sets(&describe);
        tracing::debug!(
            "deployment/{} in {} has active ReplicaSets {:?}",
            deployment,
            namespace,
            replica_sets
        );
        Ok(replica_sets)
    }

    /// Step 2: pod-template-hash label of a ReplicaSet (empty when unlabeled)
    pub async fn pod_template_hash(
        &self,
        replica_set: &str,
        namespace: &str,
    ) -> Result<String, DiscoveryError> {
        let hash = self
            .kubectl(&[
                "get".to_string(),
                format!("replicaset/{}", replica_set),
                format!("--namespace={}", namespace),
                "-o".to_string(),
                format!("jsonpath={{.metadata.labels.{}}}", POD_TEMPLATE_HASH_LABEL),
            ])
            .await?;
        Ok(hash.trim().to_string())
    }

    /// Step 3: names of pods carrying a pod-template-hash
    pub async fn pods_for_hash(
        &self,
        hash: &str,
        namespace: &str,
    ) -> Result<Vec<String>, DiscoveryError> {
        let names = self
            .kubectl(&[
                "get".to_string(),
                "pods".to_string(),
                format!("--namespace={}", namespace),
                "-o".to_string(),
                "jsonpath={.items[*].metadata.name}".to_string(),
                "-l".to_string(),
                format!("{}={}", POD_TEMPLATE_HASH_LABEL, hash),
            ])
            .await?;
        Ok(split_names(&names))
    }

    /// Run all three steps for one Deployment
    pub async fn resolve(
        &self,
        deployment: &str,
        namespace: &str,
    ) -> Result<DeploymentOwnership, DiscoveryError> {
        let replica_sets = self.active_replica_sets(deployment, namespace).await?;

        let mut pods = Vec::new();
        for replica_set in &replica_sets {
            let hash = self.pod_template_hash(replica_set, namespace).await?;
            if hash.is_empty() {
                // An empty selector value would match unrelated pods
                tracing::warn!(
                    "replicaset/{} in {} has no {} label, skipping its pods",
                    replica_set,
                    namespace,
                    POD_TEMPLATE_HASH_LABEL
                );
                continue;
            }
            for pod in self.pods_for_hash(&hash, namespace).await? {
                if !pods.contains(&pod) {
                    pods.push(pod);
                }
            }
        }

        Ok(DeploymentOwnership {
            deployment: deployment.to_string(),
            namespace: namespace.to_string(),
            replica_sets,
            pods,
        })
    }
}

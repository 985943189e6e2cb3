//! Kubernetes discovery
//!
//! For every configured Deployment and target namespace, resolves the owned pods
//! through [`OwnershipResolver`] and fetches each pod's details.

use async_trait::async_trait;
use std::sync::Arc;

use super::{DiscoveryError, DiscoveryProvider};
use crate::config::schema::{DeploymentTarget, KubernetesConfig};
use crate::exec::{CommandRunner, display_command};
use crate::kube::{DeploymentOwnership, OwnershipResolver, parse_pod_details};
use crate::models::{ALL_NAMESPACES, Environment, Workload};

/// Discovers pods of configured Deployments via kubectl
pub struct KubernetesProvider {
    runner: Arc<dyn CommandRunner>,
    kubectl: String,
    resolver: OwnershipResolver,
    config: KubernetesConfig,
}

impl KubernetesProvider {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        kubectl: impl Into<String>,
        config: KubernetesConfig,
    ) -> Self {
        let kubectl = kubectl.into();
        Self {
            resolver: OwnershipResolver::new(runner.clone(), kubectl.clone()),
            runner,
            kubectl,
            config,
        }
    }

    /// `(deployment, namespace)` pairs targeted by `env`, in configuration order
    pub fn targets(&self, env: &Environment) -> Vec<(String, String)> {
        self.config
            .deployments
            .iter()
            .flat_map(|deployment| namespaces_for(deployment, env))
            .collect()
    }

    async fn pod_workload(
        &self,
        pod: &str,
        ownership: &DeploymentOwnership,
    ) -> Result<Workload, DiscoveryError> {
        let argv = vec![
            self.kubectl.clone(),
            "get".to_string(),
            "pods".to_string(),
            pod.to_string(),
            format!("--namespace={}", ownership.namespace),
            "-o".to_string(),
            "json".to_string(),
        ];
        let output = self.runner.run(&argv).await?;
        let details = parse_pod_details(&display_command(&argv), &output.stdout)?;

        Ok(Workload::pod(
            &self.kubectl,
            details.name,
            ownership.namespace.clone(),
            details.image,
            details.phase,
            details.created_at,
            ownership.replica_sets.clone(),
        ))
    }
}

fn namespaces_for(deployment: &DeploymentTarget, env: &Environment) -> Vec<(String, String)> {
    if deployment.namespaces.is_empty() {
        // Nothing to expand "all" into
        if env.namespace == ALL_NAMESPACES {
            return Vec::new();
        }
        return vec![(deployment.name.clone(), env.namespace.clone())];
    }
    deployment
        .namespaces
        .iter()
        .filter(|ns| env.includes_namespace(ns))
        .map(|ns| (deployment.name.clone(), ns.clone()))
        .collect()
}

#[async_trait]
impl DiscoveryProvider for KubernetesProvider {
    async fn discover(&self, env: &Environment) -> Result<Vec<Workload>, DiscoveryError> {
        if env.is_local() {
            return Ok(Vec::new());
        }

        let mut workloads = Vec::new();
        for (deployment, namespace) in self.targets(env) {
            let ownership = self.resolver.resolve(&deployment, &namespace).await?;
            if ownership.is_empty() {
                tracing::info!("deployment/{} in {} owns no pods", deployment, namespace);
                continue;
            }
            for pod in &ownership.pods {
                workloads.push(self.pod_workload(pod, &ownership).await?);
            }
        }
        Ok(workloads)
    }
}

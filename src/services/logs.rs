//! Workload log retrieval through the backend CLIs

use async_trait::async_trait;
use std::sync::Arc;

use crate::exec::{CommandRunner, ExecError};
use crate::models::{Backend, Workload};
use crate::readiness::LogSource;

/// Fetches logs with `docker logs` or `kubectl logs`
pub struct CliLogSource {
    runner: Arc<dyn CommandRunner>,
    docker: String,
    kubectl: String,
}

impl CliLogSource {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        docker: impl Into<String>,
        kubectl: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            docker: docker.into(),
            kubectl: kubectl.into(),
        }
    }

    /// Command line that prints the full log of `workload`
    pub fn logs_command(&self, workload: &Workload) -> Vec<String> {
        match workload.backend() {
            Backend::Local => vec![
                self.docker.clone(),
                "logs".to_string(),
                workload.name().to_string(),
            ],
            Backend::Kubernetes => vec![
                self.kubectl.clone(),
                "logs".to_string(),
                format!("--namespace={}", workload.namespace()),
                workload.name().to_string(),
            ],
        }
    }
}

#[async_trait]
impl LogSource for CliLogSource {
    async fn fetch_logs(&self, workload: &Workload) -> Result<String, ExecError> {
        let output = self.runner.run(&self.logs_command(workload)).await?;
        // Containers commonly log to stderr; both streams make up the log
        Ok(output.combined())
    }
}

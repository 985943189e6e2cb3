//! Uniform description of one running container or pod

use chrono::{DateTime, Utc};

use super::environment::{Backend, LOCAL_NAMESPACE};

/// One running unit of an application, independent of the backend that runs it.
///
/// Workloads are only built by discovery providers through [`Workload::container`]
/// and [`Workload::pod`], which derive the exec entry point. Fields are read-only
/// once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    name: String,
    namespace: String,
    image: String,
    status: String,
    created_at: DateTime<Utc>,
    controlled_by: Vec<String>,
    exec_entry_point: Vec<String>,
    backend: Backend,
}

impl Workload {
    /// A container on the local engine
    pub fn container(
        docker_binary: &str,
        name: impl Into<String>,
        image: impl Into<String>,
        status: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        let exec_entry_point = vec![
            docker_binary.to_string(),
            "exec".to_string(),
            "-it".to_string(),
            name.clone(),
        ];
        Self {
            name,
            namespace: LOCAL_NAMESPACE.to_string(),
            image: image.into(),
            status: status.into(),
            created_at,
            controlled_by: Vec::new(),
            exec_entry_point,
            backend: Backend::Local,
        }
    }

    /// A pod owned by one or more ReplicaSets
    pub fn pod(
        kubectl_binary: &str,
        name: impl Into<String>,
        namespace: impl Into<String>,
        image: impl Into<String>,
        status: impl Into<String>,
        created_at: DateTime<Utc>,
        controlled_by: Vec<String>,
    ) -> Self {
        let name = name.into();
        let namespace = namespace.into();
        let exec_entry_point = vec![
            kubectl_binary.to_string(),
            "exec".to_string(),
            format!("--namespace={}", namespace),
            "-it".to_string(),
            name.clone(),
            "--".to_string(),
        ];
        Self {
            name,
            namespace,
            image: image.into(),
            status: status.into(),
            created_at,
            controlled_by,
            exec_entry_point,
            backend: Backend::Kubernetes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Ancestor resources, nearest first (empty for local containers)
    pub fn controlled_by(&self) -> &[String] {
        &self.controlled_by
    }

    /// Argument vector prefix that runs a trailing command inside the workload
    pub fn exec_entry_point(&self) -> &[String] {
        &self.exec_entry_point
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Full argument vector for running `command` inside the workload
    pub fn exec_command<S: AsRef<str>>(&self, command: &[S]) -> Vec<String> {
        self.exec_entry_point
            .iter()
            .cloned()
            .chain(command.iter().map(|arg| arg.as_ref().to_string()))
            .collect()
    }

    /// Stable identifier used when reporting log findings
    pub fn source_id(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

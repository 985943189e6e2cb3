//! Backend and environment selection
//!
//! Every discovery, log and exec call receives an explicit `Environment`
//! instead of reading a process-wide "current backend" setting.

use std::fmt;
use std::str::FromStr;

/// Namespace reported for workloads running on the local engine
pub const LOCAL_NAMESPACE: &str = "local";

/// Namespace value that matches every configured Kubernetes namespace
pub const ALL_NAMESPACES: &str = "all";

/// Enumeration of supported container backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Single-host container engine driven through the docker CLI
    Local,
    /// Kubernetes cluster driven through kubectl
    Kubernetes,
}

impl Backend {
    /// Get the display name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Kubernetes => "kubernetes",
        }
    }

    /// Get all backends
    pub fn all() -> &'static [Self] {
        &[Backend::Local, Backend::Kubernetes]
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "docker" => Ok(Backend::Local),
            "kubernetes" | "k8s" | "kube" => Ok(Backend::Kubernetes),
            _ => {
                let known: Vec<&str> = Backend::all().iter().map(Backend::as_str).collect();
                Err(format!(
                    "Unknown backend: {} (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            }
        }
    }
}

/// Target of one CLI invocation: a backend plus the namespace inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Environment {
    pub backend: Backend,
    pub namespace: String,
}

impl Environment {
    /// The local container engine
    pub fn local() -> Self {
        Self {
            backend: Backend::Local,
            namespace: LOCAL_NAMESPACE.to_string(),
        }
    }

    /// A Kubernetes namespace (`all` matches every configured namespace)
    pub fn kubernetes(namespace: impl Into<String>) -> Self {
        Self {
            backend: Backend::Kubernetes,
            namespace: namespace.into(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.backend == Backend::Local
    }

    /// Whether a configured namespace is targeted by this environment
    pub fn includes_namespace(&self, namespace: &str) -> bool {
        self.namespace == ALL_NAMESPACES || self.namespace == namespace
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.backend {
            Backend::Local => write!(f, "{}", LOCAL_NAMESPACE),
            Backend::Kubernetes => write!(f, "{}/{}", self.backend, self.namespace),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    /// `local` selects the local engine; anything else is a Kubernetes
    /// namespace, optionally written as `kubernetes/<namespace>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Environment must not be empty".to_string());
        }
        if s.eq_ignore_ascii_case(LOCAL_NAMESPACE) {
            return Ok(Environment::local());
        }
        if let Some((backend, namespace)) = s.split_once('/') {
            return match backend.parse::<Backend>()? {
                Backend::Local => Ok(Environment::local()),
                Backend::Kubernetes if namespace.is_empty() => {
                    Err(format!("Missing namespace in environment: {}", s))
                }
                Backend::Kubernetes => Ok(Environment::kubernetes(namespace)),
            };
        }
        Ok(Environment::kubernetes(s))
    }
}

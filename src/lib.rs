//! stevedore library
//!
//! Workload discovery, command execution, readiness polling and log scanning
//! for deployments on a local container engine or Kubernetes. The binary is a
//! thin CLI over [`services::DeploymentService`].

pub mod cli;
pub mod config;
pub mod discovery;
pub mod exec;
pub mod kube;
pub mod logscan;
pub mod models;
pub mod readiness;
pub mod services;

// Re-export commonly used types for convenience
pub use discovery::{DiscoveryError, DiscoveryProvider, Dispatcher, Pick};
pub use exec::{CommandOutput, CommandRunner, ExecError, ProcessRunner};
pub use logscan::{LogErrorsDetected, ScanPatterns, ScanReport};
pub use models::{Backend, Environment, Workload};
pub use readiness::{ReadinessError, ReadinessPoller, ReadinessState};

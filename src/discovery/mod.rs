//! Workload discovery
//!
//! A [`DiscoveryProvider`] turns one backend's view of the world into
//! [`Workload`] values. Providers are registered with the [`Dispatcher`], which
//! runs them in registration order and aggregates their results.

pub mod dispatcher;
pub mod kubernetes;
pub mod local;

pub use dispatcher::{ConsoleChecklist, DiscoveryProgress, Dispatcher, Pick, SilentProgress};
pub use kubernetes::KubernetesProvider;
pub use local::LocalProvider;

use async_trait::async_trait;

use crate::exec::ExecError;
use crate::models::{Environment, Workload};

/// Discovery errors
///
/// Zero matching resources is not an error; providers return an empty list.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("Unparsable output from `{command}`: {reason}")]
    Parse { command: String, reason: String },

    #[error("Invalid timestamp `{value}`: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Produces workloads for one backend
#[async_trait]
pub trait DiscoveryProvider: Send + Sync {
    /// Discover workloads targeted by `env`.
    ///
    /// Returns an empty list when `env` selects another backend.
    async fn discover(&self, env: &Environment) -> Result<Vec<Workload>, DiscoveryError>;
}

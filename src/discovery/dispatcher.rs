//! Discovery dispatcher
//!
//! Holds providers in registration order and runs them one after another so
//! that progress output always lines up with the backend being queried.

use super::{DiscoveryError, DiscoveryProvider};
use crate::models::{Environment, Workload};

/// Receives per-provider progress while discovery runs
pub trait DiscoveryProgress {
    fn started(&mut self, provider: &str);
    fn finished(&mut self, provider: &str, found: usize);
    fn failed(&mut self, _provider: &str, _error: &DiscoveryError) {}
}

/// Progress sink that prints a checklist to stderr
#[derive(Debug, Default)]
pub struct ConsoleChecklist;

impl DiscoveryProgress for ConsoleChecklist {
    fn started(&mut self, provider: &str) {
        eprintln!("[ ] Discovering {}...", provider);
    }

    fn finished(&mut self, provider: &str, found: usize) {
        eprintln!("[✓] Discovered {} ({} workload(s))", provider, found);
    }

    fn failed(&mut self, provider: &str, error: &DiscoveryError) {
        eprintln!("[✗] Discovering {} failed: {}", provider, error);
    }
}

/// Progress sink that discards everything
#[derive(Debug, Default)]
pub struct SilentProgress;

impl DiscoveryProgress for SilentProgress {
    fn started(&mut self, _provider: &str) {}
    fn finished(&mut self, _provider: &str, _found: usize) {}
}

/// Workload selection when several match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pick {
    /// First workload in inventory order
    #[default]
    First,
    /// Reserved for interactive selection; currently behaves like `First`
    Interactive,
}

struct Registration {
    name: String,
    provider: Box<dyn DiscoveryProvider>,
}

/// Ordered set of discovery providers
#[derive(Default)]
pub struct Dispatcher {
    registrations: Vec<Registration>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider; providers run in registration order
    pub fn register(&mut self, name: impl Into<String>, provider: Box<dyn DiscoveryProvider>) {
        let name = name.into();
        tracing::debug!("Registered discovery provider {}", name);
        self.registrations.push(Registration { name, provider });
    }

    /// Builder-style variant of [`Dispatcher::register`]
    pub fn with_provider(
        mut self,
        name: impl Into<String>,
        provider: Box<dyn DiscoveryProvider>,
    ) -> Self {
        self.register(name, provider);
        self
    }

    /// Provider names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Run every provider for `env` and concatenate their workloads.
    ///
    /// The first provider error aborts discovery; no partial inventory is returned.
    pub async fn discover_all(
        &self,
        env: &Environment,
        progress: &mut dyn DiscoveryProgress,
    ) -> Result<Vec<Workload>, DiscoveryError> {
        let mut inventory = Vec::new();
        for registration in &self.registrations {
            progress.started(&registration.name);
            match registration.provider.discover(env).await {
                Ok(workloads) => {
                    tracing::debug!(
                        "{} found {} workload(s) in {}",
                        registration.name,
                        workloads.len(),
                        env
                    );
                    progress.finished(&registration.name, workloads.len());
                    inventory.extend(workloads);
                }
                Err(e) => {
                    progress.failed(&registration.name, &e);
                    return Err(e);
                }
            }
        }
        Ok(inventory)
    }

    /// First workload discovered for `env`, if any
    pub async fn get_workload(
        &self,
        env: &Environment,
        pick: Pick,
        progress: &mut dyn DiscoveryProgress,
    ) -> Result<Option<Workload>, DiscoveryError> {
        let inventory = self.discover_all(env, progress).await?;
        if pick == Pick::Interactive && inventory.len() > 1 {
            tracing::debug!(
                "Interactive selection requested among {} workloads, using the first",
                inventory.len()
            );
        }
        Ok(inventory.into_iter().next())
    }
}

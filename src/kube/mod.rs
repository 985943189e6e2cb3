//! Kubernetes helpers built on kubectl output
//!
//! Ownership resolution (Deployment → ReplicaSet → Pod) and pod detail parsing.
//! kubectl is invoked through [`crate::exec::CommandRunner`]; nothing here talks
//! to the API server directly.

pub mod ownership;
pub mod pod;

pub use ownership::{
    DeploymentOwnership, OwnershipResolver, POD_TEMPLATE_HASH_LABEL, resolve_active_replica_sets,
    split_names,
};
pub use pod::{PodDetails, parse_pod_details};

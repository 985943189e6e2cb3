//! Stevedore model layer
//!
//! Backend-independent types shared by discovery, readiness and log scanning.

pub mod environment;
pub mod workload;

pub use environment::{ALL_NAMESPACES, Backend, Environment, LOCAL_NAMESPACE};
pub use workload::Workload;

//! Service layer for business logic
//!
//! Wires configuration, the discovery providers, readiness polling and log
//! scanning together so the CLI layer stays focused on presentation.

pub mod deployment_service;
pub mod logs;

pub use deployment_service::DeploymentService;
pub use logs::CliLogSource;

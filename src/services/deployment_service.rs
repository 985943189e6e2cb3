//! Deployment operations over discovered workloads
//!
//! This service owns the process runner and builds the discovery dispatcher,
//! readiness poller and log scan patterns from configuration.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use super::logs::CliLogSource;
use crate::config::schema::Config;
use crate::discovery::{DiscoveryProgress, Dispatcher, KubernetesProvider, LocalProvider, Pick};
use crate::exec::{CommandRunner, ProcessRunner, display_command};
use crate::logscan::{MatchFlags, PatternContribution, PatternRegistry, ScanPatterns, ScanReport};
use crate::models::{Backend, Environment, Workload};
use crate::readiness::{
    LogSource, ProgressParser, ReadinessObserver, ReadinessPoller, ReadinessState,
};

/// Service for deployment operations
pub struct DeploymentService {
    config: Config,
    runner: Arc<dyn CommandRunner>,
    dispatcher: Dispatcher,
    patterns: PatternRegistry,
    logs: CliLogSource,
}

impl DeploymentService {
    /// Service that runs real processes
    pub fn new(config: Config) -> Self {
        Self::with_runner(config, Arc::new(ProcessRunner::new()))
    }

    pub fn with_runner(config: Config, runner: Arc<dyn CommandRunner>) -> Self {
        let dispatcher = Dispatcher::new()
            .with_provider(
                Backend::Local.as_str(),
                Box::new(LocalProvider::new(
                    runner.clone(),
                    config.docker_binary.clone(),
                    config.local.clone(),
                )),
            )
            .with_provider(
                Backend::Kubernetes.as_str(),
                Box::new(KubernetesProvider::new(
                    runner.clone(),
                    config.kubectl_binary.clone(),
                    config.kubernetes.clone(),
                )),
            );

        let mut patterns = PatternRegistry::new();
        for (kind, extra) in &config.log_scan.sources {
            patterns.register_for_kind(
                kind.clone(),
                PatternContribution::new(extra.triggers.clone(), extra.exceptions.clone()),
            );
        }

        let logs = CliLogSource::new(
            runner.clone(),
            config.docker_binary.clone(),
            config.kubectl_binary.clone(),
        );

        Self {
            config,
            runner,
            dispatcher,
            patterns,
            logs,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// All workloads targeted by `env`, in provider order
    pub async fn discover(
        &self,
        env: &Environment,
        progress: &mut dyn DiscoveryProgress,
    ) -> Result<Vec<Workload>> {
        self.dispatcher
            .discover_all(env, progress)
            .await
            .with_context(|| format!("Failed to discover workloads in {}", env))
    }

    /// The workload operations act on
    pub async fn select_workload(
        &self,
        env: &Environment,
        pick: Pick,
        progress: &mut dyn DiscoveryProgress,
    ) -> Result<Workload> {
        self.dispatcher
            .get_workload(env, pick, progress)
            .await
            .with_context(|| format!("Failed to discover workloads in {}", env))?
            .ok_or_else(|| anyhow::anyhow!("No workload found in {}", env))
    }

    /// Run `command` inside the selected workload with inherited stdio.
    ///
    /// Returns the command's exit code.
    pub async fn exec(
        &self,
        env: &Environment,
        pick: Pick,
        command: &[String],
        progress: &mut dyn DiscoveryProgress,
    ) -> Result<i32> {
        if command.is_empty() {
            return Err(anyhow::anyhow!("No command given to run"));
        }
        let workload = self.select_workload(env, pick, progress).await?;
        let argv = workload.exec_command(command);
        tracing::info!("Running `{}`", display_command(&argv));
        self.runner
            .run_interactive(&argv)
            .await
            .with_context(|| format!("Failed to run command in {}", workload.source_id()))
    }

    /// Readiness poller built from the `readiness` settings
    pub fn poller(&self) -> Result<ReadinessPoller> {
        let readiness = &self.config.readiness;
        let parser = ProgressParser::new(readiness.finish_marker.clone(), &readiness.step_pattern)
            .context("Invalid readiness configuration")?;
        // A zero interval would respawn the logs command back to back
        Ok(ReadinessPoller::new(
            parser,
            Duration::from_secs(readiness.interval_seconds.max(1)),
            readiness.max_cycles,
        ))
    }

    /// Wait until the selected workload reports completion
    pub async fn wait_ready(
        &self,
        env: &Environment,
        observer: &mut dyn ReadinessObserver,
        progress: &mut dyn DiscoveryProgress,
    ) -> Result<ReadinessState> {
        let poller = self.poller()?;
        let workload = self.select_workload(env, Pick::First, progress).await?;
        poller
            .wait(&self.logs, &workload, observer)
            .await
            .with_context(|| format!("Deployment of {} did not complete", workload.source_id()))
    }

    /// Compiled scan patterns for one backend's logs
    pub fn scan_patterns(&self, backend: Backend) -> Result<ScanPatterns> {
        let log_scan = &self.config.log_scan;
        let flags = MatchFlags {
            case_insensitive: log_scan.case_insensitive,
            literal: log_scan.literal,
        };
        let patterns = self
            .patterns
            .build_patterns(
                backend.as_str(),
                &log_scan.triggers,
                &log_scan.exceptions,
                flags,
            )
            .with_context(|| format!("Invalid logScan configuration for {}", backend))?;
        tracing::debug!(
            "Scan patterns for {}: trigger `{}`, exception {:?}",
            backend,
            patterns.trigger(),
            patterns.exception()
        );
        Ok(patterns)
    }

    /// Scan the logs of every workload in `env`.
    ///
    /// Findings are not an error here; callers decide with [`ScanReport::into_result`].
    pub async fn check_logs(
        &self,
        env: &Environment,
        progress: &mut dyn DiscoveryProgress,
    ) -> Result<ScanReport> {
        let workloads = self.discover(env, progress).await?;

        let mut report = ScanReport::default();
        let mut compiled: Vec<(Backend, ScanPatterns)> = Vec::new();
        for workload in &workloads {
            let backend = workload.backend();
            let index = match compiled.iter().position(|(b, _)| *b == backend) {
                Some(index) => index,
                None => {
                    compiled.push((backend, self.scan_patterns(backend)?));
                    compiled.len() - 1
                }
            };
            let patterns = &compiled[index].1;

            let log = self
                .logs
                .fetch_logs(workload)
                .await
                .with_context(|| format!("Failed to fetch logs of {}", workload.source_id()))?;
            report.merge(patterns.scan(&workload.source_id(), &log));
        }
        Ok(report)
    }
}

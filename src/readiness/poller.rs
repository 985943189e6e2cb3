//! Time-bounded readiness polling loop

use async_trait::async_trait;
use std::time::Duration;

use super::{ProgressParser, ReadinessError, ReadinessState};
use crate::exec::ExecError;
use crate::models::Workload;

/// Supplies the latest aggregated log text of a workload
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch_logs(&self, workload: &Workload) -> Result<String, ExecError>;
}

/// Receives poller progress
pub trait ReadinessObserver {
    /// Called once per cycle with the state derived from that cycle's log
    fn on_progress(&mut self, cycle: u32, state: &ReadinessState);

    /// Called with the full accumulated log before a timeout is returned
    fn on_timeout(&mut self, _log: &str) {}
}

/// Samples workload logs at a fixed interval until the finish marker shows up
#[derive(Debug, Clone)]
pub struct ReadinessPoller {
    parser: ProgressParser,
    interval: Duration,
    max_cycles: u32,
}

impl ReadinessPoller {
    pub fn new(parser: ProgressParser, interval: Duration, max_cycles: u32) -> Self {
        Self {
            parser,
            interval,
            max_cycles: max_cycles.max(1),
        }
    }

    pub fn max_cycles(&self) -> u32 {
        self.max_cycles
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until `Complete`, or fail after exactly `max_cycles` log samples.
    ///
    /// Log fetch failures abort the wait immediately.
    pub async fn wait(
        &self,
        source: &dyn LogSource,
        workload: &Workload,
        observer: &mut dyn ReadinessObserver,
    ) -> Result<ReadinessState, ReadinessError> {
        tracing::info!(
            "Waiting for {} (every {:?}, at most {} cycles)",
            workload.source_id(),
            self.interval,
            self.max_cycles
        );

        let mut log = String::new();
        for cycle in 1..=self.max_cycles {
            log = source.fetch_logs(workload).await?;
            let state = self.parser.evaluate(&log);
            tracing::debug!("Cycle {}: {}", cycle, state);
            observer.on_progress(cycle, &state);

            if state.is_complete() {
                tracing::info!("{} finished after {} cycle(s)", workload.source_id(), cycle);
                return Ok(state);
            }

            if cycle < self.max_cycles {
                tokio::time::sleep(self.interval).await;
            }
        }

        tracing::error!(
            "{} did not finish within {} cycles",
            workload.source_id(),
            self.max_cycles
        );
        observer.on_timeout(&log);
        Err(ReadinessError::Timeout {
            cycles: self.max_cycles,
            log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readiness::DEFAULT_STEP_PATTERN;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Replays a fixed sequence of logs, repeating the last one
    struct ScriptedLogs {
        logs: Vec<&'static str>,
        fetches: Mutex<usize>,
    }

    impl ScriptedLogs {
        fn new(logs: Vec<&'static str>) -> Self {
            Self {
                logs,
                fetches: Mutex::new(0),
            }
        }

        fn fetches(&self) -> usize {
            *self.fetches.lock().unwrap()
        }
    }

    #[async_trait]
    impl LogSource for ScriptedLogs {
        async fn fetch_logs(&self, _workload: &Workload) -> Result<String, ExecError> {
            let mut fetches = self.fetches.lock().unwrap();
            let idx = (*fetches).min(self.logs.len() - 1);
            *fetches += 1;
            Ok(self.logs[idx].to_string())
        }
    }

    #[derive(Default)]
    struct Recorder {
        states: Vec<(u32, ReadinessState)>,
        dumps: Vec<String>,
    }

    impl ReadinessObserver for Recorder {
        fn on_progress(&mut self, cycle: u32, state: &ReadinessState) {
            self.states.push((cycle, state.clone()));
        }

        fn on_timeout(&mut self, log: &str) {
            self.dumps.push(log.to_string());
        }
    }

    fn poller(max_cycles: u32) -> ReadinessPoller {
        let parser = ProgressParser::new("Deployment complete", DEFAULT_STEP_PATTERN).unwrap();
        ReadinessPoller::new(parser, Duration::ZERO, max_cycles)
    }

    fn workload() -> Workload {
        Workload::container("docker", "web", "nginx", "running", Utc::now())
    }

    #[tokio::test]
    async fn test_progress_then_complete() {
        let logs = ScriptedLogs::new(vec![
            "booting\n",
            "booting\npre-init.d - 05_seed_data\n",
            "booting\npre-init.d - 05_seed_data\nDeployment complete\n",
        ]);
        let mut recorder = Recorder::default();

        let state = poller(10)
            .wait(&logs, &workload(), &mut recorder)
            .await
            .unwrap();

        assert!(state.is_complete());
        assert_eq!(logs.fetches(), 3);
        let percents: Vec<u8> = recorder.states.iter().map(|(_, s)| s.percent()).collect();
        assert_eq!(percents, [0, 5, 100]);
        assert!(recorder.dumps.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_after_exact_cycles() {
        let logs = ScriptedLogs::new(vec!["pre-init.d - 12_finalize\n"]);
        let mut recorder = Recorder::default();

        let err = poller(4)
            .wait(&logs, &workload(), &mut recorder)
            .await
            .unwrap_err();

        match err {
            ReadinessError::Timeout { cycles, log } => {
                assert_eq!(cycles, 4);
                assert_eq!(log, "pre-init.d - 12_finalize\n");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(logs.fetches(), 4);
        assert_eq!(recorder.states.len(), 4);
        assert_eq!(recorder.dumps.len(), 1);
    }

    #[test]
    fn test_zero_cycles_is_clamped() {
        assert_eq!(poller(0).max_cycles(), 1);
    }
}

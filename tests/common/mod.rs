//! Shared test helpers
//!
//! `ScriptedRunner` answers command lines from a fixed script and records every
//! invocation, standing in for docker and kubectl.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;

use stevedore::exec::{CommandOutput, CommandRunner, ExecError, display_command};

enum Reply {
    Stdout(String),
    Fail { code: i32, stderr: String },
}

/// Command runner driven by exact-match argv rules
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<(Vec<String>, Reply)>,
    calls: Mutex<Vec<Vec<String>>>,
}

fn owned(argv: &[&str]) -> Vec<String> {
    argv.iter().map(|s| s.to_string()).collect()
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `argv` with `stdout` and a zero exit status
    pub fn on(mut self, argv: &[&str], stdout: &str) -> Self {
        self.rules
            .push((owned(argv), Reply::Stdout(stdout.to_string())));
        self
    }

    /// Answer `argv` with a non-zero exit status
    pub fn fail(mut self, argv: &[&str], code: i32, stderr: &str) -> Self {
        self.rules.push((
            owned(argv),
            Reply::Fail {
                code,
                stderr: stderr.to_string(),
            },
        ));
        self
    }

    /// Every command line run so far, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, argv: &[String]) -> Result<CommandOutput, ExecError> {
        self.calls.lock().unwrap().push(argv.to_vec());
        let Some((_, reply)) = self.rules.iter().find(|(rule, _)| rule.as_slice() == argv) else {
            panic!("unscripted command: {}", display_command(argv));
        };
        match reply {
            Reply::Stdout(stdout) => Ok(CommandOutput::from_stdout(stdout.clone())),
            Reply::Fail { code, stderr } => Err(ExecError::NonZeroExit {
                command: display_command(argv),
                code: *code,
                stderr: stderr.clone(),
            }),
        }
    }

    async fn run_interactive(&self, argv: &[String]) -> Result<i32, ExecError> {
        self.calls.lock().unwrap().push(argv.to_vec());
        Ok(0)
    }
}

/// `kubectl get pods <name> -o json` output for a running pod
pub fn pod_json(name: &str, image: &str, created: &str) -> String {
    format!(
        r#"{{
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {{"name": "{name}", "creationTimestamp": "{created}"}},
            "spec": {{"containers": [{{"name": "app", "image": "{image}"}}]}},
            "status": {{"phase": "Running", "containerStatuses": [{{
                "name": "app",
                "image": "{image}",
                "imageID": "",
                "ready": true,
                "restartCount": 0
            }}]}}
        }}"#
    )
}

/// Cluster where deployment `web` in `staging` is mid-rollout: two active
/// ReplicaSets whose pod lists overlap on `p2`
pub fn rollout_cluster() -> ScriptedRunner {
    let runner = ScriptedRunner::new()
        .on(
            &["kubectl", "describe", "deployment/web", "--namespace=staging"],
            "NewReplicaSet:   rs-a,rs-b (3/3 replicas created)\n",
        )
        .on(
            &[
                "kubectl",
                "get",
                "replicaset/rs-a",
                "--namespace=staging",
                "-o",
                "jsonpath={.metadata.labels.pod-template-hash}",
            ],
            "aaa111",
        )
        .on(
            &[
                "kubectl",
                "get",
                "replicaset/rs-b",
                "--namespace=staging",
                "-o",
                "jsonpath={.metadata.labels.pod-template-hash}",
            ],
            "bbb222",
        )
        .on(
            &[
                "kubectl",
                "get",
                "pods",
                "--namespace=staging",
                "-o",
                "jsonpath={.items[*].metadata.name}",
                "-l",
                "pod-template-hash=aaa111",
            ],
            "p1 p2",
        )
        .on(
            &[
                "kubectl",
                "get",
                "pods",
                "--namespace=staging",
                "-o",
                "jsonpath={.items[*].metadata.name}",
                "-l",
                "pod-template-hash=bbb222",
            ],
            "p2 p3",
        );
    ["p1", "p2", "p3"].into_iter().fold(runner, |runner, pod| {
        runner.on(
            &["kubectl", "get", "pods", pod, "--namespace=staging", "-o", "json"],
            &pod_json(pod, "web:3.0", "2024-03-05T10:20:30Z"),
        )
    })
}

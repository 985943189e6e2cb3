//! Discovery tests
//!
//! Provider ordering in the dispatcher and end-to-end discovery on both
//! backends with scripted docker and kubectl output.

mod common;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::{Arc, Mutex};

use common::{ScriptedRunner, pod_json, rollout_cluster};
use stevedore::config::schema::{Config, DeploymentTarget, KubernetesConfig, LocalConfig};
use stevedore::discovery::{
    DiscoveryError, DiscoveryProgress, DiscoveryProvider, Dispatcher, KubernetesProvider,
    LocalProvider, Pick, SilentProgress,
};
use stevedore::models::{Backend, Environment, Workload};
use stevedore::services::DeploymentService;

/// Provider that records its invocation into a shared log
struct Recording {
    name: &'static str,
    found: Vec<&'static str>,
    journal: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl DiscoveryProvider for Recording {
    async fn discover(&self, env: &Environment) -> Result<Vec<Workload>, DiscoveryError> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{} {}", self.name, env));
        Ok(self
            .found
            .iter()
            .map(|name| Workload::container("docker", *name, "img", "running", Utc::now()))
            .collect())
    }
}

#[derive(Default)]
struct Checklist(Vec<String>);

impl DiscoveryProgress for Checklist {
    fn started(&mut self, provider: &str) {
        self.0.push(format!("[ ] {}", provider));
    }

    fn finished(&mut self, provider: &str, found: usize) {
        self.0.push(format!("[x] {} ({})", provider, found));
    }
}

#[tokio::test]
async fn test_providers_run_in_registration_order() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let provider = |name, found| {
        Box::new(Recording {
            name,
            found,
            journal: journal.clone(),
        })
    };
    let dispatcher = Dispatcher::new()
        .with_provider("a", provider("a", vec!["a1", "a2"]))
        .with_provider("b", provider("b", vec!["b1"]));
    let mut checklist = Checklist::default();

    let workloads = dispatcher
        .discover_all(&Environment::local(), &mut checklist)
        .await
        .unwrap();

    let names: Vec<&str> = workloads.iter().map(|w| w.name()).collect();
    assert_eq!(names, ["a1", "a2", "b1"]);
    assert_eq!(*journal.lock().unwrap(), ["a local", "b local"]);
    assert_eq!(
        checklist.0,
        ["[ ] a", "[x] a (2)", "[ ] b", "[x] b (1)"]
    );
}

#[tokio::test]
async fn test_get_workload_with_nothing_found() {
    let dispatcher = Dispatcher::new().with_provider(
        "a",
        Box::new(Recording {
            name: "a",
            found: vec![],
            journal: Arc::default(),
        }),
    );
    let workload = dispatcher
        .get_workload(&Environment::kubernetes("staging"), Pick::First, &mut SilentProgress)
        .await
        .unwrap();
    assert!(workload.is_none());
}

#[tokio::test]
async fn test_local_discovery_truncates_engine_timestamp() {
    let inspect = r#"[{"Created":"2024-01-01T00:00:00.123456789Z","State":{"Status":"running"},"Config":{"Image":"postgres:16"}}]"#;
    let runner = ScriptedRunner::new()
        .on(&["docker", "inspect", "--format", "json", "db"], inspect)
        .on(&["docker", "inspect", "--format", "json", "cache"], "[]");
    let provider = LocalProvider::new(
        Arc::new(runner),
        "docker",
        LocalConfig {
            services: vec!["db".to_string(), "cache".to_string()],
        },
    );

    let workloads = provider.discover(&Environment::local()).await.unwrap();

    assert_eq!(workloads.len(), 1);
    let db = &workloads[0];
    assert_eq!(db.name(), "db");
    assert_eq!(db.image(), "postgres:16");
    assert_eq!(db.backend(), Backend::Local);
    assert_eq!(
        db.created_at(),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    );
}

fn staging_cluster() -> ScriptedRunner {
    ScriptedRunner::new()
        .on(
            &["kubectl", "describe", "deployment/web", "--namespace=staging"],
            "NewReplicaSet:   web-rs (2/2 replicas created)\n",
        )
        .on(
            &[
                "kubectl",
                "get",
                "replicaset/web-rs",
                "--namespace=staging",
                "-o",
                "jsonpath={.metadata.labels.pod-template-hash}",
            ],
            "abc123",
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
                "pod-template-hash=abc123",
            ],
            "pod-1 pod-2",
        )
        .on(
            &["kubectl", "get", "pods", "pod-1", "--namespace=staging", "-o", "json"],
            &pod_json("pod-1", "web:2.0", "2024-03-05T10:20:30Z"),
        )
        .on(
            &["kubectl", "get", "pods", "pod-2", "--namespace=staging", "-o", "json"],
            &pod_json("pod-2", "web:2.0", "2024-03-05T10:21:00Z"),
        )
}

fn web_deployment(namespaces: &[&str]) -> KubernetesConfig {
    KubernetesConfig {
        deployments: vec![DeploymentTarget {
            name: "web".to_string(),
            namespaces: namespaces.iter().map(|s| s.to_string()).collect(),
        }],
    }
}

#[tokio::test]
async fn test_kubernetes_discovery_builds_pod_workloads() {
    let provider = KubernetesProvider::new(
        Arc::new(staging_cluster()),
        "kubectl",
        web_deployment(&["staging"]),
    );

    let workloads = provider
        .discover(&Environment::kubernetes("staging"))
        .await
        .unwrap();

    assert_eq!(workloads.len(), 2);
    let first = &workloads[0];
    assert_eq!(first.name(), "pod-1");
    assert_eq!(first.namespace(), "staging");
    assert_eq!(first.image(), "web:2.0");
    assert_eq!(first.status(), "Running");
    assert_eq!(first.controlled_by(), ["web-rs"]);
    assert_eq!(first.backend(), Backend::Kubernetes);
    assert_eq!(
        first.created_at(),
        Utc.with_ymd_and_hms(2024, 3, 5, 10, 20, 30).unwrap()
    );
    assert_eq!(workloads[1].name(), "pod-2");
}

#[tokio::test]
async fn test_pods_of_a_rollout_list_every_active_replica_set() {
    let provider = KubernetesProvider::new(
        Arc::new(rollout_cluster()),
        "kubectl",
        web_deployment(&["staging"]),
    );

    let workloads = provider
        .discover(&Environment::kubernetes("staging"))
        .await
        .unwrap();

    let names: Vec<&str> = workloads.iter().map(|w| w.name()).collect();
    assert_eq!(names, ["p1", "p2", "p3"]);
    for workload in &workloads {
        assert_eq!(workload.controlled_by(), ["rs-a", "rs-b"]);
        assert_eq!(workload.image(), "web:3.0");
    }
}

#[tokio::test]
async fn test_all_namespaces_expands_configured_targets() {
    let runner = Arc::new(staging_cluster());
    let provider = KubernetesProvider::new(runner.clone(), "kubectl", web_deployment(&["staging"]));

    let workloads = provider
        .discover(&Environment::kubernetes("all"))
        .await
        .unwrap();
    assert_eq!(workloads.len(), 2);

    // A namespace outside the configuration touches nothing
    let before = runner.calls().len();
    let none = provider
        .discover(&Environment::kubernetes("production"))
        .await
        .unwrap();
    assert!(none.is_empty());
    assert_eq!(runner.calls().len(), before);
}

#[tokio::test]
async fn test_service_exec_in_first_pod() {
    let runner = Arc::new(staging_cluster());
    let mut config = Config::default();
    config.kubernetes = web_deployment(&[]);
    let service = DeploymentService::with_runner(config, runner.clone());

    let code = service
        .exec(
            &Environment::kubernetes("staging"),
            Pick::First,
            &["printenv".to_string(), "HOME".to_string()],
            &mut SilentProgress,
        )
        .await
        .unwrap();

    assert_eq!(code, 0);
    let calls = runner.calls();
    assert_eq!(
        calls.last().unwrap(),
        &[
            "kubectl",
            "exec",
            "--namespace=staging",
            "-it",
            "pod-1",
            "--",
            "printenv",
            "HOME"
        ]
    );
}

#[tokio::test]
async fn test_service_check_logs_across_pods() {
    let runner = staging_cluster()
        .on(
            &["kubectl", "logs", "--namespace=staging", "pod-1"],
            "listening\n",
        )
        .on(
            &["kubectl", "logs", "--namespace=staging", "pod-2"],
            "listening\npanic: nil pointer\n",
        );
    let mut config = Config::default();
    config.kubernetes = web_deployment(&["staging"]);
    let service = DeploymentService::with_runner(config, Arc::new(runner));

    let report = service
        .check_logs(&Environment::kubernetes("staging"), &mut SilentProgress)
        .await
        .unwrap();

    assert_eq!(report.findings().len(), 1);
    let finding = &report.findings()[0];
    assert_eq!(finding.source_id, "staging/pod-2");
    assert_eq!(finding.line_number, 2);
    assert_eq!(finding.reason, "panic");
}

#[tokio::test]
async fn test_discovery_failure_is_reported() {
    let runner = ScriptedRunner::new().fail(
        &["docker", "inspect", "--format", "json", "web"],
        125,
        "permission denied while trying to connect to the Docker daemon socket",
    );
    let mut config = Config::default();
    config.local.services = vec!["web".to_string()];
    let service = DeploymentService::with_runner(config, Arc::new(runner));

    let err = service
        .discover(&Environment::local(), &mut SilentProgress)
        .await
        .unwrap_err();

    let chain = format!("{:#}", err);
    assert!(chain.contains("Failed to discover workloads in local"));
    assert!(chain.contains("permission denied"));
}

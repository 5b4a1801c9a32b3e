//! Orchestrator integration tests.
//!
//! Tests the full flow: environment config -> engine build -> start ->
//! health check -> shutdown, against an in-memory Docker runtime.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use autonet_core::config::AutonetConfig;
use autonet_core::types::{ContainerDetails, ContainerRef};
use autonet_daemon::orchestrator::Orchestrator;
use autonet_reconciler::{DockerClient, LifecycleEvent, ReconcileError};
use futures_util::{Stream, stream};
use tokio::sync::oneshot;

/// In-memory runtime with a single container.
struct FakeDocker {
    container: Mutex<ContainerDetails>,
    networks: Mutex<BTreeSet<String>>,
    connects: Mutex<Vec<(String, String, String)>>,
}

impl FakeDocker {
    fn with_labels(labels: &[(&str, &str)]) -> Self {
        Self {
            container: Mutex::new(ContainerDetails {
                id: "abc123def456".to_owned(),
                name: "web1".to_owned(),
                labels: labels
                    .iter()
                    .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                    .collect(),
                network_mode: Some("bridge".to_owned()),
                networks: BTreeSet::from(["bridge".to_owned()]),
            }),
            networks: Mutex::new(BTreeSet::from(["bridge".to_owned()])),
            connects: Mutex::new(Vec::new()),
        }
    }

    fn connects(&self) -> Vec<(String, String, String)> {
        self.connects.lock().unwrap().clone()
    }
}

impl DockerClient for FakeDocker {
    async fn list_containers(&self, _running_only: bool) -> Result<Vec<ContainerRef>, ReconcileError> {
        Ok(vec![self.container.lock().unwrap().container_ref()])
    }

    async fn inspect_container(&self, handle: &str) -> Result<ContainerDetails, ReconcileError> {
        let container = self.container.lock().unwrap();
        if container.name == handle || container.id == handle {
            Ok(container.clone())
        } else {
            Err(ReconcileError::ContainerNotFound(handle.to_owned()))
        }
    }

    async fn network_exists(&self, network: &str) -> Result<bool, ReconcileError> {
        Ok(self.networks.lock().unwrap().contains(network))
    }

    async fn create_network(&self, network: &str) -> Result<(), ReconcileError> {
        self.networks.lock().unwrap().insert(network.to_owned());
        Ok(())
    }

    async fn connect_network(
        &self,
        network: &str,
        container: &str,
        alias: &str,
    ) -> Result<(), ReconcileError> {
        self.connects.lock().unwrap().push((
            network.to_owned(),
            container.to_owned(),
            alias.to_owned(),
        ));
        self.container
            .lock()
            .unwrap()
            .networks
            .insert(network.to_owned());
        Ok(())
    }

    async fn disconnect_network(&self, network: &str, _container: &str) -> Result<(), ReconcileError> {
        self.container.lock().unwrap().networks.remove(network);
        Ok(())
    }

    fn events(&self) -> impl Stream<Item = Result<LifecycleEvent, ReconcileError>> + Send + '_ {
        stream::pending()
    }

    async fn ping(&self) -> Result<(), ReconcileError> {
        Ok(())
    }
}

fn config(extra: &[(&str, &str)]) -> AutonetConfig {
    let mut vars = vec![
        ("AUTONET_1_KEY", "autonet.pangolin"),
        ("AUTONET_1_NET", "pangolin"),
        ("AUTONET_RESCAN_SECONDS", "0"),
    ];
    vars.extend_from_slice(extra);
    AutonetConfig::from_vars(vars).expect("valid test config")
}

#[tokio::test]
async fn test_run_until_starts_and_stops_engine() {
    let docker = Arc::new(FakeDocker::with_labels(&[("autonet.pangolin", "true")]));
    let mut orchestrator = Orchestrator::with_docker(config(&[]), Arc::clone(&docker))
        .expect("orchestrator should build");

    let (tx, rx) = oneshot::channel::<()>();
    let shutdown = async move {
        let _ = rx.await;
        Ok("test")
    };

    let handle = tokio::spawn(async move {
        let result = orchestrator.run_until(shutdown).await;
        (orchestrator, result)
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        docker.connects(),
        vec![("pangolin".to_owned(), "web1".to_owned(), "web1".to_owned())]
    );

    tx.send(()).expect("orchestrator still running");
    let (orchestrator, result) = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("shutdown should complete")
        .expect("task should not panic");

    assert!(result.is_ok(), "run_until failed: {:?}", result.err());
    assert_eq!(orchestrator.engine().state_name(), "stopped");
    assert!(orchestrator.health().await.is_unhealthy());
}

#[tokio::test]
async fn test_initial_attach_disabled_leaves_container_alone() {
    let docker = Arc::new(FakeDocker::with_labels(&[("autonet.pangolin", "true")]));
    let mut orchestrator =
        Orchestrator::with_docker(config(&[("INITIAL_ATTACH", "false")]), Arc::clone(&docker))
            .expect("orchestrator should build");

    orchestrator
        .run_until(async { Ok("immediate") })
        .await
        .expect("run should succeed");

    assert!(docker.connects().is_empty());
    assert_eq!(orchestrator.engine().scans_completed(), 0);
}

#[tokio::test]
async fn test_signal_error_still_stops_engine() {
    let docker = Arc::new(FakeDocker::with_labels(&[]));
    let mut orchestrator =
        Orchestrator::with_docker(config(&[]), docker).expect("orchestrator should build");

    let result = orchestrator
        .run_until(async { Err(anyhow::anyhow!("no signal handler")) })
        .await;

    assert!(result.is_err());
    assert_eq!(orchestrator.engine().state_name(), "stopped");
}

#[test]
fn test_config_is_exposed_unchanged() {
    let docker = Arc::new(FakeDocker::with_labels(&[]));
    let orchestrator = Orchestrator::with_docker(config(&[("AUTO_DISCONNECT", "on")]), docker)
        .expect("orchestrator should build");

    assert!(orchestrator.config().auto_disconnect);
    assert_eq!(orchestrator.config().rules.len(), 1);
    assert_eq!(orchestrator.engine().state_name(), "initialized");
}

#[test]
fn test_engine_build_rejects_out_of_range_values() {
    let docker = Arc::new(FakeDocker::with_labels(&[]));
    let mut config = config(&[]);
    config.reconnect_delay_ms = 10_000_000;

    let result = Orchestrator::with_docker(config, docker);
    assert!(result.is_err());
}

#[test]
fn test_oversized_intervals_from_env_still_build_engine() {
    let docker = Arc::new(FakeDocker::with_labels(&[]));
    let config = config(&[
        ("AUTONET_RESCAN_SECONDS", "90000"),
        ("AUTONET_RECONNECT_DELAY_MS", "999999999"),
    ]);
    config.validate().expect("loaded config should validate");

    let orchestrator = Orchestrator::with_docker(config, docker);
    assert!(orchestrator.is_ok(), "engine build failed: {:?}", orchestrator.err());
}

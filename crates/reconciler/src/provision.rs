//! 네트워크 프로비저닝
//!
//! [`NetworkProvisioner`]는 규칙이 참조하는 네트워크가 존재하도록 보장합니다.
//! 생성에 실패한 네트워크는 사용 불가 집합에 기록되어 해당 규칙이 건너뛰어지며,
//! 매 재스캔마다 다시 시도됩니다.

use std::collections::HashSet;
use std::sync::Arc;

use autonet_core::metrics as m;
use autonet_core::rules::MappingTable;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::docker::DockerClient;
use crate::error::ReconcileError;

/// 규칙 네트워크 존재 보장 및 실패 기록
pub struct NetworkProvisioner<D: DockerClient> {
    docker: Arc<D>,
    networks: Vec<String>,
    unavailable: RwLock<HashSet<String>>,
}

impl<D: DockerClient> NetworkProvisioner<D> {
    pub fn new(docker: Arc<D>, rules: &MappingTable) -> Self {
        Self {
            docker,
            networks: rules.networks().into_iter().map(str::to_owned).collect(),
            unavailable: RwLock::new(HashSet::new()),
        }
    }

    /// 네트워크가 없으면 기본 설정으로 생성합니다. 여러 번 호출해도 안전합니다.
    pub async fn ensure(&self, network: &str) -> Result<(), ReconcileError> {
        let exists = self
            .docker
            .network_exists(network)
            .await
            .map_err(|e| provision_error(network, e))?;
        if exists {
            debug!(network, "network exists");
            return Ok(());
        }

        self.docker
            .create_network(network)
            .await
            .map_err(|e| provision_error(network, e))?;
        info!(network, "created network");
        Ok(())
    }

    /// 규칙의 모든 네트워크를 보장하고, 실패한 것은 사용 불가로 기록합니다.
    ///
    /// 실패하지 않으며 사용 가능한 네트워크 수를 반환합니다.
    pub async fn ensure_all(&self) -> usize {
        let mut failed = HashSet::new();
        for network in &self.networks {
            if let Err(e) = self.ensure(network).await {
                warn!(network = %network, error = %e, "network unavailable, rules using it are skipped");
                failed.insert(network.clone());
            }
        }
        let available = self.networks.len() - failed.len();
        self.replace_unavailable(failed).await;
        available
    }

    /// 사용 불가 네트워크만 다시 보장합니다.
    pub async fn retry_unavailable(&self) {
        let pending: Vec<String> = self.unavailable.read().await.iter().cloned().collect();
        if pending.is_empty() {
            return;
        }

        let mut still_failed = HashSet::new();
        for network in pending {
            match self.ensure(&network).await {
                Ok(()) => info!(network = %network, "network provisioned on retry"),
                Err(e) => {
                    warn!(network = %network, error = %e, "network still unavailable");
                    still_failed.insert(network);
                }
            }
        }
        self.replace_unavailable(still_failed).await;
    }

    /// 현재 사용 불가 네트워크 스냅샷
    pub async fn unavailable(&self) -> HashSet<String> {
        self.unavailable.read().await.clone()
    }

    async fn replace_unavailable(&self, failed: HashSet<String>) {
        metrics::gauge!(m::NETWORKS_UNAVAILABLE).set(failed.len() as f64);
        *self.unavailable.write().await = failed;
    }
}

fn provision_error(network: &str, err: ReconcileError) -> ReconcileError {
    match err {
        ReconcileError::Provision { .. } => err,
        other => ReconcileError::Provision {
            network: network.to_owned(),
            reason: other.to_string(),
        },
    }
}

//! 조정 패스 -- 레이블에서 원하는 멤버십을 계산하고 차이만 적용
//!
//! 한 번의 패스는 다음 순서로 진행됩니다.
//!
//! ```text
//! inspect (1회) → Membership 판정 → plan() → connect/disconnect 적용
//! ```
//!
//! [`plan`]은 순수 함수이며, 이미 충족된 규칙은 API 호출 전에 걸러집니다.
//! connect/disconnect 실패는 경고 후 다음 규칙으로 진행하고,
//! 컨테이너 조회 실패만 패스를 중단합니다.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use autonet_core::metrics as m;
use autonet_core::rules::MappingTable;
use autonet_core::types::ContainerRef;
use tracing::{Instrument, debug, info, info_span, trace, warn};
use uuid::Uuid;

use crate::docker::DockerClient;
use crate::error::ReconcileError;
use crate::event::PassReason;
use crate::labels::{has_label, resolve_alias};
use crate::membership::Membership;
use crate::provision::NetworkProvisioner;

/// 규칙 하나에 대한 결정
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    /// 레이블이 있고 아직 연결되지 않음
    Connect {
        rule_index: u32,
        network: String,
        alias: String,
    },
    /// 레이블이 없고, 연결되어 있으며, 다른 규칙도 원하지 않음
    Disconnect { rule_index: u32, network: String },
    /// 레이블이 있고 이미 연결됨 (또는 앞선 규칙이 연결 예정)
    Satisfied { rule_index: u32, network: String },
    /// 레이블이 없고 아무것도 하지 않음
    Unchanged { rule_index: u32, network: String },
    /// 네트워크 생성 실패로 규칙을 건너뜀
    Unavailable { rule_index: u32, network: String },
}

impl PlannedAction {
    /// Docker API 호출이 필요한 결정인지 여부
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Disconnect { .. })
    }
}

/// 규칙 목록과 현재 상태로부터 적용할 결정을 계산합니다.
///
/// 규칙 순번 순으로 하나씩 결정하며, 같은 네트워크를 가리키는 규칙이 여러 개면
/// 레이블이 하나라도 있는 한 그 네트워크에서 분리하지 않습니다.
pub fn plan(
    rules: &MappingTable,
    labels: &HashMap<String, String>,
    attached: &BTreeSet<String>,
    alias: &str,
    auto_disconnect: bool,
    unavailable: &HashSet<String>,
) -> Vec<PlannedAction> {
    let desired: HashSet<&str> = rules
        .iter()
        .filter(|rule| has_label(labels, rule))
        .map(|rule| rule.network.as_str())
        .collect();

    let mut planned: HashSet<&str> = HashSet::new();
    let mut actions = Vec::with_capacity(rules.len());

    for rule in rules {
        let network = rule.network.as_str();
        let rule_index = rule.index;

        if unavailable.contains(network) {
            actions.push(PlannedAction::Unavailable {
                rule_index,
                network: network.to_owned(),
            });
            continue;
        }

        let is_attached = attached.contains(network);
        let action = if has_label(labels, rule) {
            if is_attached || planned.contains(network) {
                PlannedAction::Satisfied {
                    rule_index,
                    network: network.to_owned(),
                }
            } else {
                planned.insert(network);
                PlannedAction::Connect {
                    rule_index,
                    network: network.to_owned(),
                    alias: alias.to_owned(),
                }
            }
        } else if is_attached
            && auto_disconnect
            && !desired.contains(network)
            && planned.insert(network)
        {
            PlannedAction::Disconnect {
                rule_index,
                network: network.to_owned(),
            }
        } else {
            PlannedAction::Unchanged {
                rule_index,
                network: network.to_owned(),
            }
        };
        actions.push(action);
    }

    actions
}

/// 조정 패스 한 번의 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// 대상 컨테이너 핸들
    pub container: String,
    /// `host`/`container:` 모드로 건너뜀
    pub unmanageable: bool,
    /// 성공한 connect 수
    pub connects: usize,
    /// 성공한 disconnect 수
    pub disconnects: usize,
    /// 실패한 connect/disconnect 수
    pub failures: usize,
    /// 이미 충족된 규칙 수
    pub satisfied: usize,
    /// 사용 불가 네트워크로 건너뛴 규칙 수
    pub unavailable: usize,
}

impl ReconcileReport {
    fn new(container: &str) -> Self {
        Self {
            container: container.to_owned(),
            ..Default::default()
        }
    }

    /// API 호출이 하나도 없었는지 여부
    pub fn is_noop(&self) -> bool {
        self.connects + self.disconnects + self.failures == 0
    }
}

/// 컨테이너 하나의 네트워크 멤버십을 규칙에 맞춥니다.
///
/// 상태를 캐시하지 않으며 매 패스마다 컨테이너를 새로 조회합니다.
pub struct Reconciler<D: DockerClient> {
    docker: Arc<D>,
    rules: Arc<MappingTable>,
    provisioner: Arc<NetworkProvisioner<D>>,
    alias_label: String,
    auto_disconnect: bool,
}

impl<D: DockerClient> Reconciler<D> {
    pub fn new(
        docker: Arc<D>,
        rules: Arc<MappingTable>,
        provisioner: Arc<NetworkProvisioner<D>>,
        alias_label: impl Into<String>,
        auto_disconnect: bool,
    ) -> Self {
        Self {
            docker,
            rules,
            provisioner,
            alias_label: alias_label.into(),
            auto_disconnect,
        }
    }

    /// 조정 패스를 한 번 실행합니다.
    ///
    /// # Errors
    ///
    /// 컨테이너 조회가 실패하면 (사라진 경우 `ContainerNotFound`) 패스를 중단합니다.
    /// connect/disconnect 실패는 에러가 아니라 `failures`로 집계됩니다.
    pub async fn reconcile(
        &self,
        container: &ContainerRef,
        reason: &PassReason,
    ) -> Result<ReconcileReport, ReconcileError> {
        let span = info_span!(
            "reconcile",
            container = %container.handle(),
            reason = %reason,
            pass_id = %Uuid::new_v4(),
        );
        self.run_pass(container, reason).instrument(span).await
    }

    async fn run_pass(
        &self,
        container: &ContainerRef,
        reason: &PassReason,
    ) -> Result<ReconcileReport, ReconcileError> {
        let details = match self.docker.inspect_container(container.handle()).await {
            Ok(details) => details,
            Err(e) => {
                metrics::counter!(m::LOOKUP_FAILURES_TOTAL).increment(1);
                return Err(e);
            }
        };

        let name = if details.name.is_empty() {
            container.handle().to_owned()
        } else {
            details.name.clone()
        };
        let mut report = ReconcileReport::new(&name);

        let attached = match Membership::of(&details) {
            Membership::Attached(networks) => networks,
            Membership::Unmanageable { network_mode } => {
                info!(
                    container = %name,
                    network_mode = %network_mode,
                    "container uses a shared network namespace, skipping"
                );
                metrics::counter!(m::UNMANAGEABLE_SKIPS_TOTAL).increment(1);
                report.unmanageable = true;
                return Ok(report);
            }
        };

        let alias = resolve_alias(&details.labels, &self.alias_label, &name);
        let unavailable = self.provisioner.unavailable().await;
        let actions = plan(
            &self.rules,
            &details.labels,
            &attached,
            &alias,
            self.auto_disconnect,
            &unavailable,
        );

        for action in actions {
            self.apply(&name, action, &mut report).await;
        }

        metrics::counter!(m::RECONCILE_PASSES_TOTAL, m::LABEL_REASON => reason.kind())
            .increment(1);
        debug!(
            container = %name,
            connects = report.connects,
            disconnects = report.disconnects,
            failures = report.failures,
            "reconciliation pass finished"
        );
        Ok(report)
    }

    async fn apply(&self, name: &str, action: PlannedAction, report: &mut ReconcileReport) {
        match action {
            PlannedAction::Connect {
                rule_index,
                network,
                alias,
            } => match self.docker.connect_network(&network, name, &alias).await {
                Ok(()) => {
                    info!(
                        container = %name,
                        network = %network,
                        alias = %alias,
                        index = rule_index,
                        "connected '{name}' to '{network}' with alias '{alias}' (index {rule_index})"
                    );
                    metrics::counter!(m::CONNECTS_TOTAL, m::LABEL_NETWORK => network, m::LABEL_RESULT => "success")
                        .increment(1);
                    report.connects += 1;
                }
                Err(e) => {
                    warn!(
                        container = %name,
                        network = %network,
                        index = rule_index,
                        error = %e,
                        "failed to connect container"
                    );
                    metrics::counter!(m::CONNECTS_TOTAL, m::LABEL_NETWORK => network, m::LABEL_RESULT => "failure")
                        .increment(1);
                    report.failures += 1;
                }
            },
            PlannedAction::Disconnect {
                rule_index,
                network,
            } => match self.docker.disconnect_network(&network, name).await {
                Ok(()) => {
                    info!(
                        container = %name,
                        network = %network,
                        index = rule_index,
                        "disconnected '{name}' from '{network}' (label removed, index {rule_index})"
                    );
                    metrics::counter!(m::DISCONNECTS_TOTAL, m::LABEL_NETWORK => network, m::LABEL_RESULT => "success")
                        .increment(1);
                    report.disconnects += 1;
                }
                Err(e) => {
                    warn!(
                        container = %name,
                        network = %network,
                        index = rule_index,
                        error = %e,
                        "failed to disconnect container"
                    );
                    metrics::counter!(m::DISCONNECTS_TOTAL, m::LABEL_NETWORK => network, m::LABEL_RESULT => "failure")
                        .increment(1);
                    report.failures += 1;
                }
            },
            PlannedAction::Satisfied {
                rule_index,
                network,
            } => {
                debug!(container = %name, network = %network, index = rule_index, "already connected");
                report.satisfied += 1;
            }
            PlannedAction::Unavailable {
                rule_index,
                network,
            } => {
                debug!(container = %name, network = %network, index = rule_index, "network unavailable, rule skipped");
                report.unavailable += 1;
            }
            PlannedAction::Unchanged {
                rule_index,
                network,
            } => {
                trace!(container = %name, network = %network, index = rule_index, "label absent, nothing to do");
            }
        }
    }
}

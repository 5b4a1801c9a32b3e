//! 전체 스캔 -- 모든 컨테이너에 조정 패스 적용
//!
//! 초기 스캔과 주기적 재스캔이 모두 [`Scanner::scan`]을 사용합니다.
//! 컨테이너마다 독립된 작업으로 실행되며 공유 세마포어로 동시 실행 수가 제한됩니다.

use std::sync::Arc;
use std::time::Instant;

use autonet_core::metrics as m;
use autonet_core::types::ContainerRef;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::docker::DockerClient;
use crate::event::PassReason;
use crate::reconcile::{ReconcileReport, Reconciler};

/// 전체 스캔 결과 집계
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// 열거된 컨테이너 수
    pub containers_seen: usize,
    /// 완료된 패스 수
    pub passes_completed: usize,
    /// 조회 실패로 중단된 패스 수
    pub lookups_failed: usize,
    /// 성공한 connect 수
    pub connects: usize,
    /// 성공한 disconnect 수
    pub disconnects: usize,
    /// 실패한 connect/disconnect 수
    pub mutation_failures: usize,
    /// 관리 불가 컨테이너 수
    pub unmanageable: usize,
}

impl ScanReport {
    fn absorb(&mut self, report: &ReconcileReport) {
        self.passes_completed += 1;
        self.connects += report.connects;
        self.disconnects += report.disconnects;
        self.mutation_failures += report.failures;
        if report.unmanageable {
            self.unmanageable += 1;
        }
    }
}

/// 컨테이너 열거 및 병렬 조정
pub struct Scanner<D: DockerClient> {
    docker: Arc<D>,
    reconciler: Arc<Reconciler<D>>,
    workers: Arc<Semaphore>,
}

impl<D: DockerClient> Scanner<D> {
    pub fn new(docker: Arc<D>, reconciler: Arc<Reconciler<D>>, workers: Arc<Semaphore>) -> Self {
        Self {
            docker,
            reconciler,
            workers,
        }
    }

    /// 컨테이너 목록을 가져옵니다. 실패하면 로그만 남기고 빈 목록을 반환합니다.
    pub async fn enumerate(&self, running_only: bool) -> Vec<ContainerRef> {
        match self.docker.list_containers(running_only).await {
            Ok(containers) => containers,
            Err(e) => {
                warn!(error = %e, running_only, "failed to list containers, scan skipped");
                Vec::new()
            }
        }
    }

    /// 모든 컨테이너를 조정합니다.
    ///
    /// 한 컨테이너의 실패는 다른 컨테이너에 영향을 주지 않습니다.
    pub async fn scan(&self, running_only: bool, reason: PassReason) -> ScanReport {
        let started = Instant::now();
        let containers = self.enumerate(running_only).await;
        let mut report = ScanReport {
            containers_seen: containers.len(),
            ..Default::default()
        };
        debug!(containers = containers.len(), reason = %reason, "scan started");

        let mut passes = JoinSet::new();
        for container in containers {
            let Ok(permit) = Arc::clone(&self.workers).acquire_owned().await else {
                warn!("worker pool closed, scan aborted");
                break;
            };
            let reconciler = Arc::clone(&self.reconciler);
            let reason = reason.clone();
            passes.spawn(async move {
                let _permit = permit;
                let result = reconciler.reconcile(&container, &reason).await;
                (container, result)
            });
        }

        while let Some(joined) = passes.join_next().await {
            match joined {
                Ok((_, Ok(pass))) => report.absorb(&pass),
                Ok((container, Err(e))) => {
                    if e.is_lookup() {
                        debug!(container = %container, "container removed during scan");
                    } else {
                        warn!(container = %container, error = %e, "reconciliation pass abandoned");
                    }
                    report.lookups_failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "reconciliation task failed");
                    report.lookups_failed += 1;
                }
            }
        }

        let elapsed = started.elapsed();
        metrics::histogram!(m::SCAN_DURATION_SECONDS).record(elapsed.as_secs_f64());
        metrics::counter!(m::SCANS_TOTAL, m::LABEL_REASON => reason.kind()).increment(1);
        info!(
            reason = %reason,
            containers = report.containers_seen,
            connects = report.connects,
            disconnects = report.disconnects,
            failures = report.mutation_failures,
            lookups_failed = report.lookups_failed,
            unmanageable = report.unmanageable,
            elapsed_ms = elapsed.as_millis() as u64,
            "scan finished"
        );
        report
    }
}

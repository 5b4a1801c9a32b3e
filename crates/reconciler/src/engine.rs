//! 조정 엔진 -- 초기 스캔, 이벤트 감시, 작업 분배, 주기적 재스캔 관리
//!
//! [`AutonetEngine`]은 core의 [`Pipeline`] trait을 구현하여
//! `autonet-daemon`에서 시작/정지/상태 확인 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! start()
//!   ├─ ping (경고만)
//!   ├─ NetworkProvisioner.ensure_all()
//!   ├─ Scanner.scan(initial)            (INITIAL_ATTACH)
//!   ├─ spawn EventWatcher ──mpsc<WorkItem>──> dispatcher ──> Reconciler (per item)
//!   └─ spawn rescan timer ──> retry_unavailable() + Scanner.scan(rescan)
//! ```
//!
//! 모든 조정 작업은 하나의 세마포어를 공유하여 동시 실행 수가 제한됩니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use autonet_core::error::{AutonetError, PipelineError};
use autonet_core::metrics as m;
use autonet_core::pipeline::{HealthStatus, Pipeline};

use crate::config::EngineConfig;
use crate::docker::DockerClient;
use crate::error::ReconcileError;
use crate::event::{PassReason, WorkItem};
use crate::provision::NetworkProvisioner;
use crate::reconcile::Reconciler;
use crate::scanner::{ScanReport, Scanner};
use crate::watcher::EventWatcher;

/// 엔진 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 작업 카운터 (태스크 간 공유)
#[derive(Debug, Default)]
struct Counters {
    passes_completed: AtomicU64,
    passes_abandoned: AtomicU64,
    events_dispatched: AtomicU64,
    scans_completed: AtomicU64,
}

impl Counters {
    fn record_scan(&self, report: &ScanReport) {
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
        self.passes_completed
            .fetch_add(report.passes_completed as u64, Ordering::Relaxed);
        self.passes_abandoned
            .fetch_add(report.lookups_failed as u64, Ordering::Relaxed);
    }
}

/// 레이블 기반 네트워크 멤버십 조정 엔진
///
/// # 사용 예시
/// ```ignore
/// use autonet_reconciler::{AutonetEngineBuilder, BollardDockerClient, EngineConfig};
///
/// let mut engine = AutonetEngineBuilder::new()
///     .config(EngineConfig::from_core(&core_config))
///     .docker_client(Arc::new(BollardDockerClient::connect_local()?))
///     .build()?;
///
/// engine.start().await?;
/// ```
pub struct AutonetEngine<D: DockerClient> {
    config: EngineConfig,
    state: EngineState,
    docker: Arc<D>,
    provisioner: Arc<NetworkProvisioner<D>>,
    reconciler: Arc<Reconciler<D>>,
    scanner: Arc<Scanner<D>>,
    workers: Arc<Semaphore>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    counters: Arc<Counters>,
}

impl<D: DockerClient> AutonetEngine<D> {
    /// 현재 상태명을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            EngineState::Initialized => "initialized",
            EngineState::Running => "running",
            EngineState::Stopped => "stopped",
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 완료된 조정 패스 수 (스캔과 이벤트 모두 포함)
    pub fn passes_completed(&self) -> u64 {
        self.counters.passes_completed.load(Ordering::Relaxed)
    }

    /// 조회 실패로 중단된 패스 수
    pub fn passes_abandoned(&self) -> u64 {
        self.counters.passes_abandoned.load(Ordering::Relaxed)
    }

    /// 작업 큐에서 처리한 이벤트 수
    pub fn events_dispatched(&self) -> u64 {
        self.counters.events_dispatched.load(Ordering::Relaxed)
    }

    /// 완료된 전체 스캔 수 (초기 스캔 포함)
    pub fn scans_completed(&self) -> u64 {
        self.counters.scans_completed.load(Ordering::Relaxed)
    }

    /// 현재 사용 불가로 표시된 네트워크 목록
    pub async fn unavailable_networks(&self) -> Vec<String> {
        let mut networks: Vec<String> = self.provisioner.unavailable().await.into_iter().collect();
        networks.sort();
        networks
    }
}

impl<D: DockerClient> Pipeline for AutonetEngine<D> {
    async fn start(&mut self) -> Result<(), AutonetError> {
        if self.state == EngineState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        info!(
            rules = self.config.rules.len(),
            auto_disconnect = self.config.auto_disconnect,
            "starting autonet engine"
        );
        for rule in &self.config.rules {
            info!(rule = %rule, "rule loaded");
        }
        metrics::gauge!(m::RULES_LOADED).set(self.config.rules.len() as f64);

        // 1. Docker 연결 확인
        if let Err(e) = self.docker.ping().await {
            warn!(error = %e, "docker daemon not reachable, continuing startup");
        }

        // 2. 규칙 네트워크 보장
        let available = self.provisioner.ensure_all().await;
        info!(
            available,
            total = self.config.rules.networks().len(),
            "rule networks provisioned"
        );

        // 3. 초기 스캔
        if self.config.initial_attach {
            let report = self
                .scanner
                .scan(self.config.initial_running_only, PassReason::Initial)
                .await;
            self.counters.record_scan(&report);
        } else {
            info!("initial attach disabled, waiting for events");
        }

        // 4. 백그라운드 태스크
        self.cancel = CancellationToken::new();
        self.tracker = TaskTracker::new();
        let (queue_tx, queue_rx) = mpsc::channel(self.config.event_queue_capacity);

        let watcher = EventWatcher::new(
            Arc::clone(&self.docker),
            queue_tx,
            self.config.reconnect_delay(),
            self.cancel.clone(),
        );
        self.tracker.spawn(watcher.run());

        self.tracker.spawn(dispatch(
            queue_rx,
            Arc::clone(&self.reconciler),
            Arc::clone(&self.workers),
            self.tracker.clone(),
            self.cancel.clone(),
            Arc::clone(&self.counters),
        ));

        if let Some(interval) = self.config.rescan_interval() {
            self.tracker.spawn(rescan_loop(
                Arc::clone(&self.scanner),
                Arc::clone(&self.provisioner),
                interval,
                self.cancel.clone(),
                Arc::clone(&self.counters),
            ));
        } else {
            info!("periodic rescan disabled");
        }

        self.state = EngineState::Running;
        info!("autonet engine started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), AutonetError> {
        if self.state != EngineState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping autonet engine");
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;

        self.state = EngineState::Stopped;
        info!(
            passes = self.passes_completed(),
            scans = self.scans_completed(),
            "autonet engine stopped"
        );
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            EngineState::Running => {
                if self.docker.ping().await.is_ok() {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded("docker daemon not reachable".to_owned())
                }
            }
            EngineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            EngineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 작업 큐를 소비하며 항목마다 조정 태스크를 하나씩 띄웁니다.
///
/// 세마포어 허가를 먼저 얻으므로 작업자가 모두 바쁘면 큐가 채워집니다.
async fn dispatch<D: DockerClient>(
    mut queue: mpsc::Receiver<WorkItem>,
    reconciler: Arc<Reconciler<D>>,
    workers: Arc<Semaphore>,
    tracker: TaskTracker,
    cancel: CancellationToken,
    counters: Arc<Counters>,
) {
    loop {
        let item = tokio::select! {
            () = cancel.cancelled() => break,
            item = queue.recv() => match item {
                Some(item) => item,
                None => break,
            },
        };

        let permit = tokio::select! {
            () = cancel.cancelled() => break,
            permit = Arc::clone(&workers).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("worker pool closed, dispatcher exiting");
                    break;
                }
            },
        };

        counters.events_dispatched.fetch_add(1, Ordering::Relaxed);
        let reconciler = Arc::clone(&reconciler);
        let counters = Arc::clone(&counters);
        tracker.spawn(async move {
            let _permit = permit;
            match reconciler.reconcile(&item.container, &item.reason).await {
                Ok(report) => {
                    counters.passes_completed.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        container = %item.container,
                        connects = report.connects,
                        disconnects = report.disconnects,
                        "event pass finished"
                    );
                }
                Err(e) if e.is_lookup() => {
                    counters.passes_abandoned.fetch_add(1, Ordering::Relaxed);
                    info!(container = %item.container, reason = %item.reason, "container gone before reconciliation");
                }
                Err(e) => {
                    counters.passes_abandoned.fetch_add(1, Ordering::Relaxed);
                    warn!(container = %item.container, reason = %item.reason, error = %e, "event pass abandoned");
                }
            }
        });
    }

    debug!("event dispatcher stopped");
}

/// 주기적 재스캔. 첫 실행은 시작 후 한 주기 뒤이며, 놓친 주기는 건너뜁니다.
async fn rescan_loop<D: DockerClient>(
    scanner: Arc<Scanner<D>>,
    provisioner: Arc<NetworkProvisioner<D>>,
    interval: Duration,
    cancel: CancellationToken,
    counters: Arc<Counters>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(interval_secs = interval.as_secs(), "periodic rescan scheduled");

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        provisioner.retry_unavailable().await;
        let report = scanner.scan(false, PassReason::Rescan).await;
        counters.record_scan(&report);
    }

    debug!("rescan timer stopped");
}

/// 조정 엔진 빌더
pub struct AutonetEngineBuilder<D: DockerClient> {
    config: Option<EngineConfig>,
    docker: Option<Arc<D>>,
}

impl<D: DockerClient> AutonetEngineBuilder<D> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: None,
            docker: None,
        }
    }

    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Docker 클라이언트를 설정합니다.
    pub fn docker_client(mut self, docker: Arc<D>) -> Self {
        self.docker = Some(docker);
        self
    }

    /// 엔진을 빌드합니다.
    ///
    /// 설정 검증에 실패하거나 필수 구성 요소가 없으면 `ReconcileError::Config`를 반환합니다.
    pub fn build(self) -> Result<AutonetEngine<D>, ReconcileError> {
        let config = self.config.ok_or_else(|| ReconcileError::Config {
            field: "config".to_owned(),
            reason: "engine config must be provided".to_owned(),
        })?;
        config.validate()?;

        let docker = self.docker.ok_or_else(|| ReconcileError::Config {
            field: "docker_client".to_owned(),
            reason: "docker client must be provided".to_owned(),
        })?;

        let rules = Arc::new(config.rules.clone());
        let workers = Arc::new(Semaphore::new(config.max_concurrent));
        let provisioner = Arc::new(NetworkProvisioner::new(Arc::clone(&docker), &rules));
        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(&docker),
            rules,
            Arc::clone(&provisioner),
            config.alias_label.clone(),
            config.auto_disconnect,
        ));
        let scanner = Arc::new(Scanner::new(
            Arc::clone(&docker),
            Arc::clone(&reconciler),
            Arc::clone(&workers),
        ));

        Ok(AutonetEngine {
            config,
            state: EngineState::Initialized,
            docker,
            provisioner,
            reconciler,
            scanner,
            workers,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            counters: Arc::new(Counters::default()),
        })
    }
}

impl<D: DockerClient> Default for AutonetEngineBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

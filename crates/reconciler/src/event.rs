//! 컨테이너 lifecycle 이벤트와 작업 큐 항목
//!
//! [`LifecycleEvent`]는 Docker 이벤트 스트림에서 받은 컨테이너 이벤트이고,
//! [`WorkItem`]은 조정 작업 큐에 들어가는 단위입니다.

use std::fmt;

use autonet_core::types::ContainerRef;

/// 컨테이너 lifecycle 상태
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LifecycleStatus {
    /// 컨테이너 시작
    Start,
    /// 컨테이너 설정 변경 (`docker update`)
    Update,
    /// 그 외 (die, stop, destroy 등)
    Other(String),
}

impl LifecycleStatus {
    /// Docker 이벤트의 `Action` 문자열을 해석합니다.
    pub fn from_action(action: &str) -> Self {
        match action {
            "start" => Self::Start,
            "update" => Self::Update,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Update => "update",
            Self::Other(action) => action,
        }
    }

    /// 조정 패스를 유발하는 상태인지 여부 (`start`, `update`)
    pub fn triggers_reconcile(&self) -> bool {
        matches!(self, Self::Start | Self::Update)
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Docker 이벤트 스트림에서 받은 컨테이너 이벤트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// 이벤트 종류
    pub status: LifecycleStatus,
    /// 컨테이너 ID
    pub container_id: String,
    /// 컨테이너 이름 (이벤트 속성 `name`, 없으면 빈 문자열)
    pub container_name: String,
}

impl LifecycleEvent {
    pub fn new(
        status: LifecycleStatus,
        container_id: impl Into<String>,
        container_name: impl Into<String>,
    ) -> Self {
        Self {
            status,
            container_id: container_id.into(),
            container_name: container_name.into(),
        }
    }

    /// 이벤트 대상 컨테이너 식별자
    pub fn container(&self) -> ContainerRef {
        ContainerRef::new(self.container_id.clone(), self.container_name.clone())
    }
}

/// 조정 패스가 실행되는 이유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassReason {
    /// 시작 시 초기 스캔
    Initial,
    /// 주기적 재스캔
    Rescan,
    /// lifecycle 이벤트
    Event(LifecycleStatus),
}

impl PassReason {
    /// 메트릭 레이블용 짧은 이름
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Rescan => "rescan",
            Self::Event(_) => "event",
        }
    }
}

impl fmt::Display for PassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => f.write_str("initial"),
            Self::Rescan => f.write_str("rescan"),
            Self::Event(status) => write!(f, "event:{status}"),
        }
    }
}

/// 조정 작업 큐 항목
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// 대상 컨테이너
    pub container: ContainerRef,
    /// 큐에 들어간 이유
    pub reason: PassReason,
}

impl WorkItem {
    pub fn from_event(event: &LifecycleEvent) -> Self {
        Self {
            container: event.container(),
            reason: PassReason::Event(event.status.clone()),
        }
    }
}

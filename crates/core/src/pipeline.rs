//! 파이프라인 trait -- 장기 실행 컴포넌트의 생명주기 정의
//!
//! ```text
//! Initialized → start() → Running → stop() → Stopped
//! ```

use std::fmt;
use std::future::Future;

use serde::Serialize;

use crate::error::AutonetError;

/// 장기 실행 컴포넌트가 구현하는 생명주기 trait
///
/// 데몬은 이 trait만으로 엔진을 시작/정지하고 상태를 조회합니다.
pub trait Pipeline: Send + Sync {
    /// 백그라운드 작업을 시작합니다.
    ///
    /// 이미 실행 중이면 [`PipelineError::AlreadyRunning`](crate::error::PipelineError)을 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), AutonetError>> + Send;

    /// 작업을 정지하고 진행 중인 작업이 끝날 때까지 기다립니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), AutonetError>> + Send;

    /// 현재 건강 상태를 확인합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// 건강 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작은 하지만 일부 기능 저하
    Degraded(String),
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

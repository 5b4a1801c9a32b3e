//! 조정 엔진 에러 타입
//!
//! [`ReconcileError`]는 조정 엔진 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<ReconcileError> for AutonetError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.
//!
//! 대부분의 변형은 복구 가능하며 호출자가 로그만 남기고 계속 진행합니다.

use autonet_core::error::{AutonetError, ConfigError, RuntimeError};

/// 조정 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Docker API 호출 실패
    #[error("docker api error: {0}")]
    DockerApi(String),

    /// Docker 소켓 연결 실패
    #[error("docker connection error: {0}")]
    DockerConnection(String),

    /// 컨테이너를 찾을 수 없음 (조회 도중 삭제됨)
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// 네트워크 생성 실패
    #[error("failed to provision network '{network}': {reason}")]
    Provision {
        /// 대상 네트워크
        network: String,
        /// 실패 사유
        reason: String,
    },

    /// connect/disconnect 실패
    #[error("network mutation failed for '{container}' on '{network}': {reason}")]
    Mutation {
        /// 대상 컨테이너 핸들
        container: String,
        /// 대상 네트워크
        network: String,
        /// 실패 사유
        reason: String,
    },

    /// 이벤트 스트림 에러
    #[error("event stream error: {0}")]
    Stream(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl ReconcileError {
    /// 컨테이너가 사라져 이번 패스를 포기해야 하는 에러인지 여부
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::ContainerNotFound(_))
    }
}

impl From<ReconcileError> for AutonetError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::DockerApi(msg) | ReconcileError::DockerConnection(msg) => {
                AutonetError::Runtime(RuntimeError::Api(msg))
            }
            ReconcileError::ContainerNotFound(handle) => {
                AutonetError::Runtime(RuntimeError::Lookup(handle))
            }
            ReconcileError::Provision { network, reason } => {
                AutonetError::Runtime(RuntimeError::Provision { network, reason })
            }
            ReconcileError::Mutation {
                container,
                network,
                reason,
            } => AutonetError::Runtime(RuntimeError::Mutation {
                container,
                network,
                reason,
            }),
            ReconcileError::Stream(msg) => AutonetError::Runtime(RuntimeError::Stream(msg)),
            ReconcileError::Config { field, reason } => {
                AutonetError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}

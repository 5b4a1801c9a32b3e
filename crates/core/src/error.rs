//! 에러 타입 -- 도메인별 에러 정의
//!
//! 치명적인 것은 [`ConfigError`]뿐입니다. 나머지는 규칙/컨테이너/주기 단위로
//! 격리되어 로그로만 보고됩니다.

/// autonet 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum AutonetError {
    /// 설정 관련 에러 (치명적)
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 생명주기 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 컨테이너 런타임 호출 에러
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 유효한 `AUTONET_<N>_KEY` / `AUTONET_<N>_NET` 쌍이 하나도 없음
    #[error("no valid rules: set at least one AUTONET_<N>_KEY / AUTONET_<N>_NET pair")]
    NoValidRules,

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline is not running")]
    NotRunning,
}

/// 컨테이너 런타임 호출 에러 (모두 복구 가능)
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// 조회 도중 컨테이너가 사라짐
    #[error("container lookup failed: {0}")]
    Lookup(String),

    /// 네트워크 생성 실패
    #[error("failed to provision network '{network}': {reason}")]
    Provision { network: String, reason: String },

    /// connect/disconnect 실패
    #[error("network mutation failed for '{container}' on '{network}': {reason}")]
    Mutation {
        container: String,
        network: String,
        reason: String,
    },

    /// 이벤트 구독 끊김
    #[error("event stream error: {0}")]
    Stream(String),

    /// 기타 Docker API 에러
    #[error("runtime api error: {0}")]
    Api(String),
}

//! 조정 엔진 설정
//!
//! [`EngineConfig`]는 core의 [`AutonetConfig`]를 기반으로 엔진 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use autonet_core::config::AutonetConfig;
//! use autonet_reconciler::config::EngineConfig;
//!
//! let core_config = AutonetConfig::from_env()?;
//! let config = EngineConfig::from_core(&core_config);
//! ```

use std::time::Duration;

use autonet_core::config::{
    AutonetConfig, DEFAULT_ALIAS_LABEL, DEFAULT_MAX_CONCURRENT, DEFAULT_RECONNECT_DELAY_MS,
    DEFAULT_RESCAN_SECONDS, MAX_CONCURRENT, MAX_RECONNECT_DELAY_MS, MAX_RESCAN_SECONDS,
};
use autonet_core::rules::MappingTable;
use serde::Serialize;

use crate::error::ReconcileError;

/// 조정 엔진 설정
#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    /// 레이블 → 네트워크 규칙
    pub rules: MappingTable,
    /// 별칭 레이블 키
    pub alias_label: String,
    /// 레이블 제거 시 분리 여부
    pub auto_disconnect: bool,
    /// 시작 시 전체 스캔 여부
    pub initial_attach: bool,
    /// 초기 스캔을 실행 중인 컨테이너로 한정할지 여부
    pub initial_running_only: bool,
    /// 재스캔 간격 (초, 0이면 비활성)
    pub rescan_interval_secs: u64,
    /// 동시 조정 작업 상한
    pub max_concurrent: usize,
    /// 구독 실패 시 재시도 지연 (밀리초, 0이면 즉시)
    pub reconnect_delay_ms: u64,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 이벤트 작업 큐 용량
    pub event_queue_capacity: usize,
}

/// 설정 상한값 상수 (나머지 상한은 core와 공유)
const MAX_EVENT_QUEUE_CAPACITY: usize = 65_536;
const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 1024;

impl EngineConfig {
    /// 기본값으로 설정을 생성합니다.
    pub fn new(rules: MappingTable) -> Self {
        Self {
            rules,
            alias_label: DEFAULT_ALIAS_LABEL.to_owned(),
            auto_disconnect: false,
            initial_attach: true,
            initial_running_only: false,
            rescan_interval_secs: DEFAULT_RESCAN_SECONDS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }

    /// core 설정에서 엔진 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &AutonetConfig) -> Self {
        Self {
            alias_label: core.alias_label.clone(),
            auto_disconnect: core.auto_disconnect,
            initial_attach: core.initial_attach,
            initial_running_only: core.initial_running_only,
            rescan_interval_secs: core.rescan_seconds,
            max_concurrent: core.max_concurrent,
            reconnect_delay_ms: core.reconnect_delay_ms,
            ..Self::new(core.rules.clone())
        }
    }

    /// 재스캔 간격 (비활성이면 `None`)
    pub fn rescan_interval(&self) -> Option<Duration> {
        (self.rescan_interval_secs > 0).then(|| Duration::from_secs(self.rescan_interval_secs))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.rules.is_empty() {
            return Err(ReconcileError::Config {
                field: "rules".to_owned(),
                reason: "at least one rule is required".to_owned(),
            });
        }

        if self.alias_label.trim().is_empty() {
            return Err(ReconcileError::Config {
                field: "alias_label".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.max_concurrent == 0 || self.max_concurrent > MAX_CONCURRENT {
            return Err(ReconcileError::Config {
                field: "max_concurrent".to_owned(),
                reason: format!("must be 1-{MAX_CONCURRENT}"),
            });
        }

        if self.rescan_interval_secs > MAX_RESCAN_SECONDS {
            return Err(ReconcileError::Config {
                field: "rescan_interval_secs".to_owned(),
                reason: format!("must be 0-{MAX_RESCAN_SECONDS}"),
            });
        }

        if self.reconnect_delay_ms > MAX_RECONNECT_DELAY_MS {
            return Err(ReconcileError::Config {
                field: "reconnect_delay_ms".to_owned(),
                reason: format!("must be 0-{MAX_RECONNECT_DELAY_MS}"),
            });
        }

        if self.event_queue_capacity == 0 || self.event_queue_capacity > MAX_EVENT_QUEUE_CAPACITY
        {
            return Err(ReconcileError::Config {
                field: "event_queue_capacity".to_owned(),
                reason: format!("must be 1-{MAX_EVENT_QUEUE_CAPACITY}"),
            });
        }

        Ok(())
    }
}

/// 엔진 설정 빌더
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// 규칙 테이블로 새 빌더를 생성합니다.
    pub fn new(rules: MappingTable) -> Self {
        Self {
            config: EngineConfig::new(rules),
        }
    }

    pub fn alias_label(mut self, label: impl Into<String>) -> Self {
        self.config.alias_label = label.into();
        self
    }

    pub fn auto_disconnect(mut self, enabled: bool) -> Self {
        self.config.auto_disconnect = enabled;
        self
    }

    pub fn initial_attach(mut self, enabled: bool) -> Self {
        self.config.initial_attach = enabled;
        self
    }

    pub fn initial_running_only(mut self, enabled: bool) -> Self {
        self.config.initial_running_only = enabled;
        self
    }

    /// 재스캔 간격(초)을 설정합니다. 0이면 비활성.
    pub fn rescan_interval_secs(mut self, secs: u64) -> Self {
        self.config.rescan_interval_secs = secs;
        self
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.config.max_concurrent = max;
        self
    }

    pub fn reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.config.reconnect_delay_ms = ms;
        self
    }

    pub fn event_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.event_queue_capacity = capacity;
        self
    }

    /// 설정을 검증하고 반환합니다.
    pub fn build(self) -> Result<EngineConfig, ReconcileError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//! 설정 관리 -- 환경변수 기반 런타임 설정
//!
//! [`AutonetConfig`]는 프로세스 전체 설정을 담는 최상위 구조체입니다.
//! 설정 파일은 없으며 모든 값은 환경변수에서 읽습니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (로그 관련 값만, 데몬에서 적용)
//! 2. 환경변수
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```
//! use autonet_core::config::AutonetConfig;
//!
//! let config = AutonetConfig::from_vars([
//!     ("AUTONET_1_KEY", "autonet.pangolin"),
//!     ("AUTONET_1_NET", "pangolin"),
//!     ("AUTO_DISCONNECT", "yes"),
//! ])
//! .unwrap();
//! assert!(config.auto_disconnect);
//! assert_eq!(config.rules.len(), 1);
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;

use serde::Serialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::rules::MappingTable;

/// 별칭 레이블 기본 키
pub const DEFAULT_ALIAS_LABEL: &str = "com.pangolin.autonet.alias";
/// 주기적 재스캔 기본 간격 (초)
pub const DEFAULT_RESCAN_SECONDS: u64 = 30;
/// 동시 조정 작업 기본 상한
pub const DEFAULT_MAX_CONCURRENT: usize = 8;
/// 구독 실패 시 재시도 기본 지연 (밀리초)
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;
/// 재스캔 간격 상한 (초)
pub const MAX_RESCAN_SECONDS: u64 = 86_400;
/// 재구독 지연 상한 (밀리초)
pub const MAX_RECONNECT_DELAY_MS: u64 = 300_000;
/// 동시 조정 작업 상한
pub const MAX_CONCURRENT: usize = 256;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 2] = ["json", "pretty"];

type VarMap = HashMap<String, String>;

/// 로깅 관련 설정
///
/// 규칙 로딩보다 먼저 로깅을 초기화할 수 있도록 독립적으로 읽을 수 있습니다.
#[derive(Debug, Clone, Serialize)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 추가로 로그를 기록할 파일 경로
    pub log_file: Option<String>,
    /// `AUTONET_DEBUG` -- 켜지면 로그 레벨이 debug로 고정됨
    pub debug: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            log_file: None,
            debug: false,
        }
    }
}

impl GeneralConfig {
    /// 프로세스 환경변수에서 로깅 설정을 읽습니다.
    pub fn from_env() -> Self {
        Self::from_map(&std::env::vars().collect())
    }

    /// 주어진 변수 목록에서 로깅 설정을 읽습니다.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_map(&collect_vars(vars))
    }

    fn from_map(vars: &VarMap) -> Self {
        let mut config = Self::default();
        override_string(&mut config.log_level, vars, "AUTONET_LOG_LEVEL");
        override_string(&mut config.log_format, vars, "AUTONET_LOG_FORMAT");
        config.log_level = config.log_level.to_ascii_lowercase();
        config.log_format = config.log_format.to_ascii_lowercase();
        override_optional(&mut config.log_file, vars, "LOG_FILE");
        override_bool(&mut config.debug, vars, "AUTONET_DEBUG");
        config
    }

    /// 실제로 적용할 로그 레벨
    pub fn effective_level(&self) -> &str {
        if self.debug { "debug" } else { &self.log_level }
    }

    /// 로깅 설정의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "AUTONET_LOG_LEVEL".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "AUTONET_LOG_FORMAT".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_FORMATS.join(", ")),
            });
        }
        Ok(())
    }
}

/// autonet 통합 설정
#[derive(Debug, Clone, Serialize)]
pub struct AutonetConfig {
    /// 로깅 설정
    pub general: GeneralConfig,
    /// 레이블 → 네트워크 규칙
    pub rules: MappingTable,
    /// 별칭을 담는 레이블 키
    pub alias_label: String,
    /// 시작 시 전체 조정 수행 여부
    pub initial_attach: bool,
    /// 시작 시 실행 중인 컨테이너만 조정할지 여부
    pub initial_running_only: bool,
    /// 레이블이 사라지면 해당 네트워크에서 분리할지 여부
    pub auto_disconnect: bool,
    /// 재스캔 간격 (초, 0이면 비활성)
    pub rescan_seconds: u64,
    /// 명시적 Docker 소켓 경로
    pub docker_socket: Option<String>,
    /// 동시 조정 작업 상한
    pub max_concurrent: usize,
    /// 이벤트 구독 실패 시 재시도 지연 (밀리초)
    pub reconnect_delay_ms: u64,
    /// Prometheus exporter 바인드 주소
    pub metrics_addr: Option<String>,
}

impl AutonetConfig {
    /// 프로세스 환경변수에서 설정을 로드하고 검증합니다.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_map(&std::env::vars().collect())
    }

    /// 주어진 변수 목록에서 설정을 로드하고 검증합니다.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_map(&collect_vars(vars))
    }

    fn from_map(vars: &VarMap) -> Result<Self, ConfigError> {
        let general = GeneralConfig::from_map(vars);
        let rules = MappingTable::load(vars.iter())?;

        let mut config = Self {
            general,
            rules,
            alias_label: DEFAULT_ALIAS_LABEL.to_owned(),
            initial_attach: true,
            initial_running_only: false,
            auto_disconnect: false,
            rescan_seconds: DEFAULT_RESCAN_SECONDS,
            docker_socket: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            metrics_addr: None,
        };

        override_string(&mut config.alias_label, vars, "LABEL_ALIAS_KEY");
        override_bool(&mut config.initial_attach, vars, "INITIAL_ATTACH");
        override_bool(
            &mut config.initial_running_only,
            vars,
            "INITIAL_RUNNING_ONLY",
        );
        override_bool(&mut config.auto_disconnect, vars, "AUTO_DISCONNECT");
        override_rescan_seconds(&mut config.rescan_seconds, vars, "AUTONET_RESCAN_SECONDS");
        override_optional(&mut config.docker_socket, vars, "AUTONET_DOCKER_SOCKET");
        override_usize(&mut config.max_concurrent, vars, "AUTONET_MAX_CONCURRENT");
        override_u64_capped(
            &mut config.reconnect_delay_ms,
            vars,
            "AUTONET_RECONNECT_DELAY_MS",
            MAX_RECONNECT_DELAY_MS,
        );
        override_optional(&mut config.metrics_addr, vars, "AUTONET_METRICS_ADDR");

        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.general.validate()?;

        if self.max_concurrent == 0 || self.max_concurrent > MAX_CONCURRENT {
            return Err(ConfigError::InvalidValue {
                field: "AUTONET_MAX_CONCURRENT".to_owned(),
                reason: format!("must be 1..={MAX_CONCURRENT}, got {}", self.max_concurrent),
            });
        }

        if self.rescan_seconds > MAX_RESCAN_SECONDS {
            return Err(ConfigError::InvalidValue {
                field: "AUTONET_RESCAN_SECONDS".to_owned(),
                reason: format!("must be 0..={MAX_RESCAN_SECONDS}, got {}", self.rescan_seconds),
            });
        }

        if self.reconnect_delay_ms > MAX_RECONNECT_DELAY_MS {
            return Err(ConfigError::InvalidValue {
                field: "AUTONET_RECONNECT_DELAY_MS".to_owned(),
                reason: format!(
                    "must be 0..={MAX_RECONNECT_DELAY_MS}, got {}",
                    self.reconnect_delay_ms
                ),
            });
        }

        if let Some(addr) = &self.metrics_addr {
            if addr.parse::<SocketAddr>().is_err() {
                return Err(ConfigError::InvalidValue {
                    field: "AUTONET_METRICS_ADDR".to_owned(),
                    reason: format!("'{addr}' is not a valid host:port socket address"),
                });
            }
        }

        Ok(())
    }
}

/// 불리언 환경변수 값을 해석합니다.
///
/// `1/true/yes/y/on`, `0/false/no/n/off`만 인식하며 (대소문자 무시)
/// 그 외에는 `None`을 반환합니다.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn collect_vars<I, K, V>(vars: I) -> VarMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    vars.into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// --- 환경변수 오버라이드 헬퍼 ---
// 빈 값은 설정되지 않은 것으로 취급한다.

fn lookup<'a>(vars: &'a VarMap, key: &str) -> Option<&'a str> {
    vars.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn override_string(target: &mut String, vars: &VarMap, key: &str) {
    if let Some(val) = lookup(vars, key) {
        *target = val.to_owned();
    }
}

fn override_optional(target: &mut Option<String>, vars: &VarMap, key: &str) {
    if let Some(val) = lookup(vars, key) {
        *target = Some(val.to_owned());
    }
}

fn override_bool(target: &mut bool, vars: &VarMap, key: &str) {
    if let Some(val) = lookup(vars, key) {
        match parse_bool(val) {
            Some(parsed) => *target = parsed,
            None => warn!(
                env_key = key,
                value = val,
                default = *target,
                "failed to parse bool from env var, keeping default"
            ),
        }
    }
}

fn override_usize(target: &mut usize, vars: &VarMap, key: &str) {
    if let Some(val) = lookup(vars, key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key = key,
                value = val,
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

/// 상한을 넘는 값은 상한으로 맞춘다.
fn override_u64_capped(target: &mut u64, vars: &VarMap, key: &str, max: u64) {
    if let Some(val) = lookup(vars, key) {
        match val.parse::<u64>() {
            Ok(parsed) if parsed > max => {
                warn!(env_key = key, value = parsed, max, "value above maximum, clamped");
                *target = max;
            }
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key = key,
                value = val,
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

/// 음수는 0(비활성)으로, 상한 초과는 상한으로, 숫자가 아니면 기본값 유지.
fn override_rescan_seconds(target: &mut u64, vars: &VarMap, key: &str) {
    if let Some(val) = lookup(vars, key) {
        match val.parse::<i64>() {
            Ok(parsed) if parsed < 0 => {
                warn!(
                    env_key = key,
                    value = parsed,
                    "negative rescan interval, periodic rescan disabled"
                );
                *target = 0;
            }
            Ok(parsed) if parsed.unsigned_abs() > MAX_RESCAN_SECONDS => {
                warn!(
                    env_key = key,
                    value = parsed,
                    max = MAX_RESCAN_SECONDS,
                    "rescan interval above maximum, clamped"
                );
                *target = MAX_RESCAN_SECONDS;
            }
            Ok(parsed) => *target = parsed.unsigned_abs(),
            Err(_) => warn!(
                env_key = key,
                value = val,
                default = *target,
                "failed to parse rescan interval, keeping default"
            ),
        }
    }
}

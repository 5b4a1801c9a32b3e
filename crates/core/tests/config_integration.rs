//! 환경변수 기반 설정 통합 테스트
//!
//! - 실제 프로세스 환경변수에서 규칙/옵션 로딩
//! - 번호 공백, 불완전한 규칙 처리
//! - 잘못된 값의 기본값 폴백

use autonet_core::config::{AutonetConfig, DEFAULT_ALIAS_LABEL};
use autonet_core::error::ConfigError;

/// 테스트 동안 환경변수를 설정하고 끝나면 원래 값으로 되돌립니다.
struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn set(vars: &[(&str, &str)]) -> Self {
        let mut saved = Vec::new();
        for (key, value) in vars {
            saved.push(((*key).to_owned(), std::env::var(key).ok()));
            // SAFETY: 테스트는 serial로 직렬화되어 환경변수 조작이 안전합니다.
            unsafe { std::env::set_var(key, value) };
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, original) in self.saved.drain(..) {
            // SAFETY: 테스트 정리
            unsafe {
                match original {
                    Some(val) => std::env::set_var(&key, val),
                    None => std::env::remove_var(&key),
                }
            }
        }
    }
}

// =============================================================================
// 프로세스 환경변수 로딩
// =============================================================================

#[test]
#[serial_test::serial]
fn from_env_loads_rules_and_options() {
    let _env = EnvGuard::set(&[
        ("AUTONET_1_KEY", "autonet.pangolin"),
        ("AUTONET_1_NET", "pangolin"),
        ("AUTONET_2_KEY", "autonet.media"),
        ("AUTONET_2_NET", "media_net"),
        ("AUTO_DISCONNECT", "true"),
        ("AUTONET_RESCAN_SECONDS", "15"),
    ]);

    let config = AutonetConfig::from_env().expect("config should load");

    assert!(config.rules.len() >= 2);
    assert!(config.rules.networks().contains(&"pangolin"));
    assert!(config.rules.networks().contains(&"media_net"));
    assert!(config.auto_disconnect);
    assert_eq!(config.rescan_seconds, 15);
}

#[test]
#[serial_test::serial]
fn from_env_drops_key_only_index() {
    let _env = EnvGuard::set(&[
        ("AUTONET_1_KEY", "autonet.pangolin"),
        ("AUTONET_1_NET", "pangolin"),
        ("AUTONET_3_KEY", "autonet.orphan"),
        ("AUTONET_3_NET", ""),
    ]);

    let config = AutonetConfig::from_env().expect("config should load");

    assert!(config.rules.iter().all(|rule| rule.index != 3));
    assert!(config.rules.iter().any(|rule| rule.index == 1));
}

#[test]
#[serial_test::serial]
fn from_env_alias_label_override() {
    let _env = EnvGuard::set(&[
        ("AUTONET_1_KEY", "autonet.pangolin"),
        ("AUTONET_1_NET", "pangolin"),
        ("LABEL_ALIAS_KEY", "example.alias"),
    ]);

    let config = AutonetConfig::from_env().expect("config should load");
    assert_eq!(config.alias_label, "example.alias");
    assert_ne!(config.alias_label, DEFAULT_ALIAS_LABEL);
}

// =============================================================================
// 변수 목록 기반 로딩
// =============================================================================

#[test]
fn from_vars_without_rules_is_fatal() {
    let err = AutonetConfig::from_vars([("AUTONET_1_NET", "pangolin")]).unwrap_err();
    assert!(matches!(err, ConfigError::NoValidRules));
}

#[test]
fn from_vars_spec_example_rules() {
    let config = AutonetConfig::from_vars([
        ("AUTONET_1_KEY", "autonet.pangolin"),
        ("AUTONET_1_NET", "pangolin"),
        ("AUTONET_2_KEY", "autonet.media"),
        ("AUTONET_2_NET", "media_net"),
        ("AUTONET_3_KEY", "autonet.orphan"),
    ])
    .expect("config should load");

    let loaded: Vec<(u32, &str, &str)> = config
        .rules
        .iter()
        .map(|r| (r.index, r.label_key.as_str(), r.network.as_str()))
        .collect();
    assert_eq!(
        loaded,
        vec![
            (1, "autonet.pangolin", "pangolin"),
            (2, "autonet.media", "media_net"),
        ]
    );
}

#[test]
fn from_vars_all_options() {
    let config = AutonetConfig::from_vars([
        ("AUTONET_1_KEY", "autonet.pangolin"),
        ("AUTONET_1_NET", "pangolin"),
        ("INITIAL_ATTACH", "off"),
        ("INITIAL_RUNNING_ONLY", "yes"),
        ("AUTO_DISCONNECT", "on"),
        ("AUTONET_RESCAN_SECONDS", "120"),
        ("AUTONET_DOCKER_SOCKET", "/run/docker.sock"),
        ("AUTONET_MAX_CONCURRENT", "4"),
        ("AUTONET_RECONNECT_DELAY_MS", "250"),
        ("AUTONET_METRICS_ADDR", "0.0.0.0:9100"),
        ("AUTONET_LOG_FORMAT", "pretty"),
        ("AUTONET_DEBUG", "true"),
    ])
    .expect("config should load");

    assert!(!config.initial_attach);
    assert!(config.initial_running_only);
    assert!(config.auto_disconnect);
    assert_eq!(config.rescan_seconds, 120);
    assert_eq!(config.docker_socket.as_deref(), Some("/run/docker.sock"));
    assert_eq!(config.max_concurrent, 4);
    assert_eq!(config.reconnect_delay_ms, 250);
    assert_eq!(config.metrics_addr.as_deref(), Some("0.0.0.0:9100"));
    assert_eq!(config.general.log_format, "pretty");
    assert_eq!(config.general.effective_level(), "debug");
}

#[test]
fn from_vars_invalid_numbers_keep_defaults() {
    let config = AutonetConfig::from_vars([
        ("AUTONET_1_KEY", "autonet.pangolin"),
        ("AUTONET_1_NET", "pangolin"),
        ("AUTONET_MAX_CONCURRENT", "many"),
        ("AUTONET_RECONNECT_DELAY_MS", "-1"),
    ])
    .expect("config should load");

    assert_eq!(config.max_concurrent, 8);
    assert_eq!(config.reconnect_delay_ms, 1000);
}

//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `autonet_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(autonet_core::metrics::RECONCILE_PASSES_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 조정 사유 레이블 키 (initial, rescan, event)
pub const LABEL_REASON: &str = "reason";

/// 네트워크 이름 레이블 키
pub const LABEL_NETWORK: &str = "network";

// ─── Reconciler 메트릭 ──────────────────────────────────────────────

/// 완료된 조정 패스 수 (counter, label: reason)
pub const RECONCILE_PASSES_TOTAL: &str = "autonet_reconcile_passes_total";

/// connect 호출 수 (counter, labels: network, result)
pub const CONNECTS_TOTAL: &str = "autonet_connects_total";

/// disconnect 호출 수 (counter, labels: network, result)
pub const DISCONNECTS_TOTAL: &str = "autonet_disconnects_total";

/// host/container 네트워크 모드로 건너뛴 횟수 (counter)
pub const UNMANAGEABLE_SKIPS_TOTAL: &str = "autonet_unmanageable_skips_total";

/// 컨테이너 조회 실패 수 (counter)
pub const LOOKUP_FAILURES_TOTAL: &str = "autonet_lookup_failures_total";

// ─── Event Source 메트릭 ────────────────────────────────────────────

/// 수신한 lifecycle 이벤트 수 (counter)
pub const EVENTS_RECEIVED_TOTAL: &str = "autonet_events_received_total";

/// 이벤트 스트림 재구독 횟수 (counter)
pub const STREAM_RECONNECTS_TOTAL: &str = "autonet_stream_reconnects_total";

// ─── Scanner / Provisioner 메트릭 ───────────────────────────────────

/// 완료된 전체 스캔 수 (counter, label: reason)
pub const SCANS_TOTAL: &str = "autonet_scans_total";

/// 전체 스캔 소요 시간 (histogram, 초)
pub const SCAN_DURATION_SECONDS: &str = "autonet_scan_duration_seconds";

/// 로드된 규칙 수 (gauge)
pub const RULES_LOADED: &str = "autonet_rules_loaded";

/// 생성에 실패해 사용할 수 없는 네트워크 수 (gauge)
pub const NETWORKS_UNAVAILABLE: &str = "autonet_networks_unavailable";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "autonet_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "autonet_daemon_build_info";

/// 스캔 소요 시간 히스토그램 버킷 (초)
pub const SCAN_DURATION_BUCKETS: [f64; 8] = [0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0];

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        RECONCILE_PASSES_TOTAL,
        "Reconciliation passes completed, by reason"
    );
    describe_counter!(CONNECTS_TOTAL, "Network connect calls, by network and result");
    describe_counter!(
        DISCONNECTS_TOTAL,
        "Network disconnect calls, by network and result"
    );
    describe_counter!(
        UNMANAGEABLE_SKIPS_TOTAL,
        "Passes skipped because the container shares another network namespace"
    );
    describe_counter!(
        LOOKUP_FAILURES_TOTAL,
        "Container lookups that failed during a pass"
    );
    describe_counter!(
        EVENTS_RECEIVED_TOTAL,
        "Container lifecycle events received from the runtime"
    );
    describe_counter!(
        STREAM_RECONNECTS_TOTAL,
        "Event stream resubscription attempts"
    );
    describe_counter!(SCANS_TOTAL, "Full container scans completed, by reason");
    describe_histogram!(SCAN_DURATION_SECONDS, "Time to complete a full scan in seconds");
    describe_gauge!(RULES_LOADED, "Number of label to network rules loaded");
    describe_gauge!(
        NETWORKS_UNAVAILABLE,
        "Networks that could not be provisioned and are skipped"
    );
    describe_gauge!(DAEMON_UPTIME_SECONDS, "autonet daemon uptime in seconds");
    describe_gauge!(DAEMON_BUILD_INFO, "Build information (always 1, with version label)");
}

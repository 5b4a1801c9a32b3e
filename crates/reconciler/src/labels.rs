//! 레이블 해석 -- 규칙 충족 여부와 별칭 결정
//!
//! 모두 레이블 스냅샷에 대한 순수 함수이며 런타임을 조회하지 않습니다.

use std::collections::HashMap;

use autonet_core::rules::Rule;

/// 규칙의 레이블 키가 비어 있지 않은 값으로 존재하는지 여부
///
/// 값의 내용(`"false"`, `"0"` 등)은 해석하지 않습니다.
pub fn has_label(labels: &HashMap<String, String>, rule: &Rule) -> bool {
    labels
        .get(&rule.label_key)
        .is_some_and(|value| !value.trim().is_empty())
}

/// 컨테이너가 사용할 네트워크 별칭을 결정합니다.
///
/// 별칭 레이블 값이 유효하면 그대로, 아니면 컨테이너 이름을 사용합니다.
pub fn resolve_alias(
    labels: &HashMap<String, String>,
    alias_label: &str,
    container_name: &str,
) -> String {
    match labels.get(alias_label).map(|v| v.trim()) {
        Some(alias) if is_valid_alias(alias) => alias.to_owned(),
        Some(invalid) if !invalid.is_empty() => {
            tracing::debug!(
                alias = invalid,
                container = container_name,
                "invalid alias label value, using container name"
            );
            container_name.to_owned()
        }
        _ => container_name.to_owned(),
    }
}

/// `[A-Za-z0-9-]+`
pub fn is_valid_alias(alias: &str) -> bool {
    !alias.is_empty() && alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

//! 네트워크 멤버십 판정
//!
//! 다른 컨테이너나 호스트의 네트워크 네임스페이스를 공유하는 컨테이너는
//! 네트워크를 따로 붙이거나 뗄 수 없으므로 관리 대상에서 제외합니다.

use std::collections::BTreeSet;

use autonet_core::types::ContainerDetails;

/// 컨테이너의 현재 네트워크 멤버십
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    /// 현재 연결된 네트워크 이름
    Attached(BTreeSet<String>),
    /// `host` 또는 `container:<id>` 모드
    Unmanageable { network_mode: String },
}

impl Membership {
    /// 조회 결과에서 멤버십을 판정합니다.
    pub fn of(details: &ContainerDetails) -> Self {
        match details.network_mode.as_deref() {
            Some(mode) if is_shared_namespace(mode) => Self::Unmanageable {
                network_mode: mode.to_owned(),
            },
            _ => Self::Attached(details.networks.clone()),
        }
    }
}

fn is_shared_namespace(mode: &str) -> bool {
    mode == "host" || mode.starts_with("container:")
}

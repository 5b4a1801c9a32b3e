//! 도메인 타입 -- 컨테이너 식별자와 조회 결과
//!
//! 조정 한 번마다 새로 조회되며 캐시되지 않습니다.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;

/// 컨테이너 식별자
///
/// 런타임 호출과 로그에는 이름을 핸들로 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContainerRef {
    /// 컨테이너 ID
    pub id: String,
    /// 컨테이너 이름 (앞의 `/` 제거됨)
    pub name: String,
}

impl ContainerRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: normalize_name(&name.into()),
        }
    }

    /// 런타임 호출에 쓰는 핸들 (이름이 없으면 ID)
    pub fn handle(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.handle(), short_id(&self.id))
    }
}

/// 컨테이너 조회(inspect) 결과
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerDetails {
    /// 컨테이너 ID
    pub id: String,
    /// 컨테이너 이름
    pub name: String,
    /// 레이블 스냅샷
    pub labels: HashMap<String, String>,
    /// `HostConfig.NetworkMode` (`bridge`, `host`, `container:<id>` 등)
    pub network_mode: Option<String>,
    /// 현재 연결된 네트워크 이름
    pub networks: BTreeSet<String>,
}

impl ContainerDetails {
    pub fn container_ref(&self) -> ContainerRef {
        ContainerRef::new(self.id.clone(), self.name.clone())
    }
}

/// Docker가 붙이는 앞쪽 `/`를 제거합니다.
pub fn normalize_name(name: &str) -> String {
    name.trim_start_matches('/').to_owned()
}

/// 로그용 12자리 ID
pub fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

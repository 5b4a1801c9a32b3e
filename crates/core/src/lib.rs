//! autonet-core -- 공통 타입, 규칙 테이블, 에러, 설정
//!
//! 레이블 기반 네트워크 멤버십 조정기의 모든 크레이트가 공유하는
//! 정의를 담습니다. 런타임 호출은 하지 않습니다.

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod rules;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{AutonetError, ConfigError, PipelineError, RuntimeError};

// 설정
pub use config::{AutonetConfig, GeneralConfig};

// 파이프라인 trait
pub use pipeline::{HealthStatus, Pipeline};

// 규칙
pub use rules::{MappingTable, Rule};

// 도메인 타입
pub use types::{ContainerDetails, ContainerRef};

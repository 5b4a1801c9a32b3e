//! autonet-reconciler -- 레이블 기반 Docker 네트워크 멤버십 조정 엔진
//!
//! 레이블 `K`가 붙은 컨테이너를 `K`에 매핑된 네트워크에 별칭과 함께 연결하고,
//! `AUTO_DISCONNECT`가 켜져 있으면 레이블이 제거된 네트워크에서만 분리합니다.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ReconcileError`)
//! - [`config`]: Engine configuration (`EngineConfig`, builder)
//! - [`event`]: Lifecycle events and work items (`LifecycleEvent`, `WorkItem`, `PassReason`)
//! - [`docker`]: Docker API abstraction (`DockerClient` trait, `BollardDockerClient`)
//! - [`labels`]: Label presence and alias resolution
//! - [`membership`]: Network membership oracle (`Membership`)
//! - [`provision`]: Network provisioning (`NetworkProvisioner`)
//! - [`reconcile`]: Per-container reconciliation (`plan`, `Reconciler`)
//! - [`scanner`]: Full scans (`Scanner`, `ScanReport`)
//! - [`watcher`]: Event stream supervision (`EventWatcher`)
//! - [`engine`]: Main orchestrator (`AutonetEngine`, `AutonetEngineBuilder`)
//!
//! # Architecture
//!
//! ```text
//! docker events --> EventWatcher --mpsc--> dispatcher --+
//!                                                        |
//! rescan timer ---> Scanner ----------------------------+--> Reconciler --> connect / disconnect
//!                                                        |
//! start() --------> Scanner (initial) ------------------+
//! ```

pub mod config;
pub mod docker;
pub mod engine;
pub mod error;
pub mod event;
pub mod labels;
pub mod membership;
pub mod provision;
pub mod reconcile;
pub mod scanner;
pub mod watcher;

// --- Public API Re-exports ---

// Engine (main orchestrator)
pub use engine::{AutonetEngine, AutonetEngineBuilder};

// Configuration
pub use config::{EngineConfig, EngineConfigBuilder};

// Error
pub use error::ReconcileError;

// Events
pub use event::{LifecycleEvent, LifecycleStatus, PassReason, WorkItem};

// Docker API
pub use docker::{BollardDockerClient, DockerClient};

// Reconciliation
pub use membership::Membership;
pub use provision::NetworkProvisioner;
pub use reconcile::{PlannedAction, ReconcileReport, Reconciler, plan};
pub use scanner::{ScanReport, Scanner};
pub use watcher::EventWatcher;

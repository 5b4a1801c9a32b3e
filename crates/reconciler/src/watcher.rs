//! 이벤트 감시 -- Docker 이벤트 스트림을 작업 큐로 전달
//!
//! [`EventWatcher`]는 취소될 때까지 구독을 유지하는 감독 루프입니다.
//!
//! # 재구독 정책
//! - 이벤트를 하나라도 전달한 스트림이 끝나면 즉시 재구독
//! - 아무것도 전달하지 못하고 실패하면 고정 지연(`reconnect_delay`) 후 재구독
//! - 시도 횟수에 제한은 없으며 지연은 늘어나지 않음

use std::sync::Arc;
use std::time::Duration;

use autonet_core::metrics as m;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::docker::DockerClient;
use crate::event::WorkItem;

/// 구독 한 번의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionOutcome {
    /// 스트림 종료 또는 에러 (수신한 이벤트 수)
    Ended { delivered: usize },
    /// 작업 큐 수신측이 닫힘
    QueueClosed,
}

/// Docker 이벤트 스트림 감독 루프
pub struct EventWatcher<D: DockerClient> {
    docker: Arc<D>,
    queue: mpsc::Sender<WorkItem>,
    reconnect_delay: Duration,
    cancel: CancellationToken,
}

impl<D: DockerClient> EventWatcher<D> {
    pub fn new(
        docker: Arc<D>,
        queue: mpsc::Sender<WorkItem>,
        reconnect_delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            docker,
            queue,
            reconnect_delay,
            cancel,
        }
    }

    /// 취소되거나 작업 큐가 닫힐 때까지 구독을 반복합니다.
    pub async fn run(self) {
        let mut attempt: u64 = 0;
        info!("event watcher started");

        loop {
            let outcome = tokio::select! {
                () = self.cancel.cancelled() => break,
                outcome = self.consume_once() => outcome,
            };

            let delivered = match outcome {
                SessionOutcome::QueueClosed => {
                    warn!("work queue closed, event watcher exiting");
                    break;
                }
                SessionOutcome::Ended { delivered } => delivered,
            };

            attempt += 1;
            metrics::counter!(m::STREAM_RECONNECTS_TOTAL).increment(1);

            if delivered == 0 && !self.reconnect_delay.is_zero() {
                info!(
                    attempt,
                    delay_ms = self.reconnect_delay.as_millis() as u64,
                    "resubscribing to docker events after delay"
                );
                tokio::select! {
                    () = self.cancel.cancelled() => break,
                    () = tokio::time::sleep(self.reconnect_delay) => {}
                }
            } else {
                info!(attempt, "resubscribing to docker events");
            }
        }

        info!(resubscriptions = attempt, "event watcher stopped");
    }

    async fn consume_once(&self) -> SessionOutcome {
        let events = self.docker.events();
        let mut events = std::pin::pin!(events);
        let mut delivered = 0usize;

        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, delivered, "docker event stream failed");
                    return SessionOutcome::Ended { delivered };
                }
            };

            delivered += 1;
            metrics::counter!(m::EVENTS_RECEIVED_TOTAL).increment(1);

            if !event.status.triggers_reconcile() {
                trace!(status = %event.status, container_id = %event.container_id, "ignoring event");
                continue;
            }

            let work = WorkItem::from_event(&event);
            debug!(
                container = %work.container,
                reason = %work.reason,
                "queueing reconciliation"
            );
            if self.queue.send(work).await.is_err() {
                return SessionOutcome::QueueClosed;
            }
        }

        info!(delivered, "docker event stream ended");
        SessionOutcome::Ended { delivered }
    }
}

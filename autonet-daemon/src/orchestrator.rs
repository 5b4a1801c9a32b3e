//! Daemon orchestration -- engine assembly, lifecycle and signal handling.
//!
//! The [`Orchestrator`] is the central coordinator of `autonet-daemon`.
//! It takes a validated [`AutonetConfig`], optionally installs the
//! Prometheus recorder, connects to Docker, builds the reconciliation
//! engine and runs it until SIGTERM or SIGINT.
//!
//! # Lifecycle
//!
//! 1. Engine start (provision networks, initial pass, spawn watcher/dispatcher/rescan)
//! 2. Uptime updater (only with metrics enabled)
//! 3. Wait for shutdown signal
//! 4. Engine stop (waits for in-flight reconciliations)

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::broadcast;

use autonet_core::config::AutonetConfig;
use autonet_core::metrics as m;
use autonet_core::pipeline::{HealthStatus, Pipeline};
use autonet_reconciler::{
    AutonetEngine, AutonetEngineBuilder, BollardDockerClient, DockerClient, EngineConfig,
};

use crate::metrics_server;

/// Uptime gauge refresh period.
const UPTIME_UPDATE_SECS: u64 = 10;

/// The main daemon orchestrator.
pub struct Orchestrator<D: DockerClient = BollardDockerClient> {
    /// Loaded and validated configuration.
    config: AutonetConfig,
    /// Reconciliation engine.
    engine: AutonetEngine<D>,
    /// Shutdown broadcast sender (signals background tasks).
    shutdown_tx: broadcast::Sender<()>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator<BollardDockerClient> {
    /// Build from an already-loaded configuration using the local Docker daemon.
    ///
    /// Installs the metrics recorder first when `AUTONET_METRICS_ADDR` is set.
    ///
    /// # Errors
    ///
    /// - Configuration validation fails
    /// - The metrics recorder cannot be installed
    /// - The Docker client cannot be created
    pub fn build_from_config(config: AutonetConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if let Some(addr) = &config.metrics_addr {
            metrics_server::install_metrics_recorder(addr)?;
            record_daemon_metrics();
        }

        let docker = Arc::new(
            BollardDockerClient::connect(config.docker_socket.as_deref())
                .map_err(|e| anyhow::anyhow!("failed to create docker client: {}", e))?,
        );
        Self::with_docker(config, docker)
    }
}

impl<D: DockerClient> Orchestrator<D> {
    /// Build with a caller-supplied Docker client.
    pub fn with_docker(config: AutonetConfig, docker: Arc<D>) -> Result<Self> {
        let engine_config = EngineConfig::from_core(&config);
        let engine = AutonetEngineBuilder::new()
            .config(engine_config)
            .docker_client(docker)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build engine: {}", e))?;

        tracing::info!(
            rules = config.rules.len(),
            rescan_seconds = config.rescan_seconds,
            auto_disconnect = config.auto_disconnect,
            "orchestrator initialized"
        );

        let (shutdown_tx, _) = broadcast::channel(4);
        Ok(Self {
            config,
            engine,
            shutdown_tx,
            start_time: Instant::now(),
        })
    }

    /// Start the engine and block until SIGTERM or SIGINT.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(wait_for_shutdown_signal()).await
    }

    /// Start the engine and block until `shutdown` resolves.
    ///
    /// The future yields the name of the trigger for logging.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = Result<&'static str>>,
    {
        self.engine.start().await?;

        let uptime_task = self
            .config
            .metrics_addr
            .is_some()
            .then(|| spawn_uptime_updater(self.start_time, self.shutdown_tx.subscribe()));

        tracing::info!("autonet-daemon running");
        let signal = shutdown.await;
        match &signal {
            Ok(name) => tracing::info!(signal = name, "shutdown signal received"),
            Err(e) => tracing::error!(error = %e, "signal handling failed, shutting down"),
        }

        let _ = self.shutdown_tx.send(());
        if let Some(task) = uptime_task {
            let _ = task.await;
        }

        tracing::info!("stopping engine");
        self.engine.stop().await?;

        signal.map(|_| ())
    }

    /// Current engine health.
    pub async fn health(&self) -> HealthStatus {
        self.engine.health_check().await
    }

    pub fn engine(&self) -> &AutonetEngine<D> {
        &self.engine
    }

    pub fn config(&self) -> &AutonetConfig {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Record daemon-level metrics once at startup.
fn record_daemon_metrics() {
    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "daemon metrics recorded");
}

/// Spawn a background task that periodically updates the uptime metric.
fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(UPTIME_UPDATE_SECS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let uptime_secs = start_time.elapsed().as_secs();
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
            }
        }
    })
}

mod shutdown;

pub use shutdown::Shutdown;

use std::net::SocketAddr;
use std::time::Duration;

use common::controller::Controller;
use common::peer::protocol::pull_buckets;
use common::prelude::PublicKey;
use futures::future::join_all;
use iroh::Endpoint;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

use crate::http_server;
use crate::{ServiceConfig, ServiceState};

/// Handle for stopping the node and waiting for its tasks.
pub struct ShutdownHandle {
    signals: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
    shutdown: Shutdown,
}

impl ShutdownHandle {
    /// Block until a signal or [`ShutdownHandle::shutdown`] stops the node.
    pub async fn wait(self) {
        shutdown_and_join(self.signals, self.handles).await;
    }

    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }
}

fn level_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Stdout logging plus, with a `log_dir`, a daily rolling `cbn.log`.
/// The returned guards flush the writers when dropped.
fn init_logging(
    service_config: &ServiceConfig,
) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let level = service_config.log_level;
    let (stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let mut guards = vec![stdout_guard];

    let file_layer = service_config.log_dir.as_ref().and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("cannot create log directory {}: {}", dir.display(), e);
            return None;
        }
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "cbn.log"));
        guards.push(guard);
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(level_filter(level)),
        )
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(stdout)
                .with_filter(level_filter(level)),
        )
        .with(file_layer)
        .init();

    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(%location, "panic: {}", info);
    }));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cbn node starting");

    guards
}

/// Create service state from config, exiting on error.
async fn create_state(service_config: &ServiceConfig) -> ServiceState {
    match ServiceState::from_config(service_config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("error creating server state: {}", e);
            std::process::exit(3);
        }
    }
}

/// Wait for the stop request, then give every task a bounded time to finish.
async fn shutdown_and_join(
    signals: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
) {
    let _ = signals.await;

    if timeout(FINAL_SHUTDOWN_TIMEOUT, join_all(handles))
        .await
        .is_err()
    {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        std::process::exit(4);
    }
}

/// Pull buckets from `peers` every `period` until shutdown.
async fn run_bucket_sync(
    endpoint: Endpoint,
    controller: Controller,
    peers: Vec<PublicKey>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = pull_buckets(&endpoint, &controller, &peers).await;
                if report.saved > 0 || report.failed > 0 {
                    tracing::info!(
                        saved = report.saved,
                        skipped = report.skipped,
                        failed = report.failed,
                        "pulled buckets from peers"
                    );
                }
            }
            _ = shutdown_rx.changed() => break,
        }
    }
}

/// Create state and spawn background tasks, returning the state handle.
///
/// The returned `ShutdownHandle` must be kept alive; dropping it does not stop the service.
pub async fn start_service(service_config: &ServiceConfig) -> (ServiceState, ShutdownHandle) {
    let shutdown = Shutdown::new();
    let signals = match shutdown.on_signals() {
        Ok(signals) => signals,
        Err(e) => {
            tracing::error!("cannot listen for shutdown signals: {}", e);
            std::process::exit(2);
        }
    };
    let shutdown_rx = shutdown.subscribe();
    let state = create_state(service_config).await;

    let mut handles = Vec::new();

    if let Some(peer) = state.peer().cloned() {
        let controller = state.controller().clone();

        if let Some(period) = service_config.sync_interval {
            if !service_config.peers.is_empty() {
                let sync_handle = tokio::spawn(run_bucket_sync(
                    peer.endpoint().clone(),
                    controller.clone(),
                    service_config.peers.clone(),
                    period,
                    shutdown_rx.clone(),
                ));
                handles.push(sync_handle);
            }
        }

        let peer_rx = shutdown_rx.clone();
        let peer_handle = tokio::spawn(async move {
            if let Err(e) = common::peer::spawn(peer, controller, peer_rx).await {
                tracing::error!("Peer error: {}", e);
            }
        });
        handles.push(peer_handle);
    }

    let api_port = service_config.api_port;
    let api_addr = SocketAddr::from(([0, 0, 0, 0], api_port));
    let api_state = state.clone();
    let api_config = http_server::Config::new(api_addr);
    let api_rx = shutdown_rx.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = http_server::run_api(api_config, api_state, api_rx).await {
            tracing::error!("API server error: {}", e);
        }
    });
    handles.push(api_handle);

    tracing::info!("Running: Peer + API on port {}", api_port);

    let handle = ShutdownHandle {
        signals,
        handles,
        shutdown,
    };

    (state, handle)
}

/// Spawns the node: P2P peer + API server.
/// Blocks until shutdown signal is received.
pub async fn spawn_service(service_config: &ServiceConfig) {
    let _guards = init_logging(service_config);
    let (_, handle) = start_service(service_config).await;
    handle.wait().await;
}

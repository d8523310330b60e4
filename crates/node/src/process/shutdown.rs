use std::io;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One stop request fanned out to the peer, the API server and the bucket
/// sync loop. Each of them holds a receiver from [`Shutdown::subscribe`].
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: watch::Sender<()>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        self.tx.send_replace(());
    }

    /// Trigger on SIGINT or SIGTERM. The returned task ends once any stop
    /// request, signal or [`Shutdown::trigger`], has been seen.
    pub fn on_signals(&self) -> io::Result<JoinHandle<()>> {
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut stopped = self.subscribe();
        let shutdown = self.clone();

        Ok(tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => tracing::info!("interrupted, stopping node"),
                _ = sigterm.recv() => tracing::info!("terminated, stopping node"),
                _ = stopped.changed() => {
                    tracing::debug!("shutdown requested");
                    return;
                }
            }
            shutdown.trigger();
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_every_subscriber() {
        let shutdown = Shutdown::new();
        let mut api = shutdown.subscribe();
        let mut sync = shutdown.subscribe();
        let watcher = shutdown.on_signals().unwrap();

        shutdown.trigger();
        api.changed().await.unwrap();
        sync.changed().await.unwrap();
        watcher.await.unwrap();
    }
}

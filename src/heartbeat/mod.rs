//! Backend liveness monitoring
//!
//! One periodic /health probe for the lifetime of the monitor, independent
//! of whether a recognition session is running. Consumers watch a
//! [`BackendStatus`] channel; probe failures never propagate past the
//! probing task.

use crate::transport::Backend;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Backend liveness as far as the client can tell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// No probe has completed yet
    Unknown,
    Alive,
    Dead,
}

/// Last known backend status, published on every probe
#[derive(Debug, Clone)]
pub struct BackendStatus {
    pub liveness: Liveness,

    /// Inference device reported by the last successful probe
    pub device: Option<String>,
}

impl Default for BackendStatus {
    fn default() -> Self {
        Self {
            liveness: Liveness::Unknown,
            device: None,
        }
    }
}

/// Periodic backend-liveness probe
pub struct HeartbeatMonitor {
    status_rx: watch::Receiver<BackendStatus>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl HeartbeatMonitor {
    /// Start probing immediately and then every `interval`
    pub fn start(backend: Arc<dyn Backend>, interval: Duration) -> Self {
        let (status_tx, status_rx) = watch::channel(BackendStatus::default());
        let token = CancellationToken::new();

        let probe_token = token.clone();
        let task = tokio::spawn(async move {
            info!("Heartbeat monitor started (every {:?})", interval);

            loop {
                let status = match backend.health().await {
                    Ok(health) if health.ok => {
                        debug!("Backend alive on {}", health.device);
                        BackendStatus {
                            liveness: Liveness::Alive,
                            device: Some(health.device),
                        }
                    }
                    Ok(_) => BackendStatus {
                        liveness: Liveness::Dead,
                        device: None,
                    },
                    Err(e) => {
                        warn!("Health probe failed: {:#}", e);
                        BackendStatus {
                            liveness: Liveness::Dead,
                            device: None,
                        }
                    }
                };

                // Receivers may all be gone; the probe keeps running anyway
                status_tx.send_replace(status);

                tokio::select! {
                    _ = probe_token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }

            info!("Heartbeat monitor stopped");
        });

        Self {
            status_rx,
            token,
            task: Some(task),
        }
    }

    /// Watch channel carrying the latest probe result
    pub fn subscribe(&self) -> watch::Receiver<BackendStatus> {
        self.status_rx.clone()
    }

    /// Latest probe result
    pub fn status(&self) -> BackendStatus {
        self.status_rx.borrow().clone()
    }

    /// Stop probing and wait for the task to finish
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Heartbeat task panicked: {}", e);
            }
        }
    }
}

impl Drop for HeartbeatMonitor {
    fn drop(&mut self) {
        // Joining is only possible via shutdown(); at minimum the probe
        // loop must not outlive its owner
        self.token.cancel();
    }
}

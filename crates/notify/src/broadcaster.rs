//! Connection registry and broadcast fan-out.
//!
//! Delivery is at-most-once per connected observer per alert. A failure
//! on one connection never aborts delivery to the rest: the full pass
//! runs first, then every failed or already-closed connection is
//! removed from the registry.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use regmon_core::Alert;

use crate::frames::{alert_frame, device_status_frame};

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("connection closed")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),
}

/// A live observer connection handle.
#[async_trait]
pub trait Observer: Send + Sync {
    /// Push one JSON frame to this observer.
    async fn send(&self, frame: &str) -> Result<(), SendError>;

    /// Whether the underlying connection still looks alive. Closed
    /// connections are pruned without a send attempt.
    fn is_open(&self) -> bool {
        true
    }
}

/// Counts from one broadcast pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    pub delivered: usize,
    pub pruned: usize,
}

/// Registry of observer connections, shared by all device pipelines.
/// Entries are added on connect and removed on disconnect or delivery
/// failure.
#[derive(Default)]
pub struct Broadcaster {
    connections: RwLock<HashMap<String, Box<dyn Observer>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, id: impl Into<String>, observer: Box<dyn Observer>) {
        let id = id.into();
        let mut connections = self.connections.write().await;
        connections.insert(id.clone(), observer);
        info!(connection_id = %id, total = connections.len(), "observer connected");
    }

    pub async fn unregister(&self, id: &str) {
        let mut connections = self.connections.write().await;
        if connections.remove(id).is_some() {
            info!(connection_id = %id, total = connections.len(), "observer disconnected");
        }
    }

    /// Number of currently registered observers, for health reporting.
    pub async fn observer_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Broadcast an alert to all registered observers, then a
    /// device-status frame carrying the alert's level.
    ///
    /// Fire-and-forget from the pipeline's perspective: delivery
    /// failures are logged and pruned, never surfaced.
    pub async fn broadcast(&self, alert: &Alert) -> BroadcastOutcome {
        let observers = self.observer_count().await;
        info!(
            device_id = %alert.device_id,
            level = %alert.level,
            observers,
            "broadcasting alert"
        );

        let outcome = self.send_to_all(&alert_frame(alert)).await;

        // Follow-up status notification for dashboards tracking
        // per-device health.
        let status = self
            .send_to_all(&device_status_frame(&alert.device_id, alert.level))
            .await;
        debug!(delivered = status.delivered, "device status notified");

        outcome
    }

    /// One full delivery pass. Failed and already-closed connections
    /// are collected during the pass and removed afterwards.
    async fn send_to_all(&self, frame: &str) -> BroadcastOutcome {
        let mut delivered = 0usize;
        let mut failed: Vec<String> = Vec::new();

        {
            let connections = self.connections.read().await;
            for (id, observer) in connections.iter() {
                if !observer.is_open() {
                    failed.push(id.clone());
                    continue;
                }
                match observer.send(frame).await {
                    Ok(()) => delivered += 1,
                    Err(e) => {
                        warn!(connection_id = %id, error = %e, "delivery failed");
                        failed.push(id.clone());
                    }
                }
            }
        }

        let pruned = failed.len();
        if pruned > 0 {
            let mut connections = self.connections.write().await;
            for id in &failed {
                connections.remove(id);
            }
            warn!(pruned, remaining = connections.len(), "removed dead observers");
        }

        BroadcastOutcome { delivered, pruned }
    }
}

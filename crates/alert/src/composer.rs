//! Builds the user-facing alert from detection and analysis output.
//!
//! Persistence is a hand-off: a failed insert (or status update) is
//! logged and the composed in-memory alert is still returned, so the
//! pipeline can push a transient alert even when storage is down.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use regmon_core::{
    determine_alert_level, Alert, AlertLevel, Anomaly, AnomalyResult, RootCauseResult, StoreError,
};

// ── Collaborator seams ──────────────────────────────────────────────

/// Alert persistence. A successful insert returns the stored copy with
/// `id` and `created_at` assigned.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert(&self, alert: &Alert) -> Result<Alert, StoreError>;
}

/// Device-status update keyed by alert level.
#[async_trait]
pub trait DeviceStatusSink: Send + Sync {
    async fn update_status(&self, device_id: &str, level: AlertLevel) -> Result<(), StoreError>;
}

// ── Composer ────────────────────────────────────────────────────────

/// Composes an alert from an anomalous result and its root cause.
#[async_trait]
pub trait Composer: Send + Sync {
    async fn compose(
        &self,
        device_id: &str,
        anomaly_result: &AnomalyResult,
        root_cause: &RootCauseResult,
    ) -> Alert;
}

pub struct AlertComposer {
    store: Arc<dyn AlertStore>,
    status: Arc<dyn DeviceStatusSink>,
}

impl AlertComposer {
    pub fn new(store: Arc<dyn AlertStore>, status: Arc<dyn DeviceStatusSink>) -> Self {
        Self { store, status }
    }
}

#[async_trait]
impl Composer for AlertComposer {
    async fn compose(
        &self,
        device_id: &str,
        anomaly_result: &AnomalyResult,
        root_cause: &RootCauseResult,
    ) -> Alert {
        let level = determine_alert_level(&anomaly_result.anomalies);
        let message = render_message(&anomaly_result.anomalies, root_cause);

        let alert = Alert {
            id: None,
            device_id: device_id.to_string(),
            level,
            message,
            anomalies: anomaly_result.anomalies.clone(),
            root_cause: root_cause.clone(),
            created_at: anomaly_result.timestamp,
        };

        match self.store.insert(&alert).await {
            Ok(stored) => {
                info!(device_id, level = %level, alert_id = ?stored.id, "alert created");
                if let Err(e) = self.status.update_status(device_id, level).await {
                    warn!(device_id, error = %e, "device status update failed");
                }
                stored
            }
            Err(e) => {
                error!(device_id, error = %e, "alert persistence failed, keeping transient alert");
                alert
            }
        }
    }
}

/// Deterministic message: each anomalous metric with its z-score,
/// followed by the resolved cause.
fn render_message(anomalies: &[Anomaly], root_cause: &RootCauseResult) -> String {
    let descriptions: Vec<String> = anomalies
        .iter()
        .map(|a| format!("{} (z-score {:.2})", a.metric.display_name(), a.z_score))
        .collect();

    format!(
        "Anomalies detected: {}. {}",
        descriptions.join(", "),
        root_cause.cause
    )
}

//! Concurrent multi-device sweep.
//!
//! Each device's run is an independent unit of work; one device failing
//! or stalling never blocks the others. Completion order follows task
//! completion, not submission — callers needing per-device results key
//! off `PipelineState::device_id`.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info};

use regmon_core::Reading;

use crate::pipeline::Pipeline;
use crate::state::PipelineState;

/// Run the pipeline for a batch of `(device_id, reading)` pairs
/// concurrently, returning whatever states completed.
pub async fn run_sweep(
    pipeline: Arc<Pipeline>,
    batch: Vec<(String, Reading)>,
) -> Vec<PipelineState> {
    let total = batch.len();
    info!(devices = total, "starting detection sweep");

    let mut tasks = JoinSet::new();
    for (device_id, reading) in batch {
        let pipeline = pipeline.clone();
        tasks.spawn(async move { pipeline.run(&device_id, reading).await });
    }

    let mut states = Vec::with_capacity(total);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(state) => states.push(state),
            // A panicked device task is dropped; the sweep carries on.
            Err(e) => error!(error = %e, "device pipeline task failed"),
        }
    }

    info!(completed = states.len(), devices = total, "sweep finished");
    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use regmon_alert::{AlertComposer, MemoryAlertStore, MemoryStatusSink};
    use regmon_core::{AnalysisMethod, Anomaly, AnomalyResult, RootCauseResult};
    use regmon_detect::{DetectError, Detector, StaticBaselineProvider, ZScoreDetector};
    use regmon_notify::Broadcaster;
    use regmon_analysis::CauseAnalyzer;

    struct StubAnalyzer;

    #[async_trait]
    impl CauseAnalyzer for StubAnalyzer {
        async fn analyze(&self, _anomalies: &[Anomaly]) -> RootCauseResult {
            RootCauseResult {
                cause: "test".into(),
                recommendation: "test".into(),
                confidence: 0.8,
                method: AnalysisMethod::RuleBased,
                rule_id: None,
            }
        }
    }

    /// Fails for one specific device, passes through for the rest.
    struct FlakyDetector {
        inner: ZScoreDetector,
        poison: &'static str,
    }

    #[async_trait]
    impl Detector for FlakyDetector {
        async fn detect(
            &self,
            device_id: &str,
            reading: &regmon_core::Reading,
        ) -> Result<AnomalyResult, DetectError> {
            if device_id == self.poison {
                return Err(DetectError::Internal("store timeout".into()));
            }
            self.inner.detect(device_id, reading).await
        }
    }

    fn reading(device_id: &str, outlet: f64) -> (String, Reading) {
        (
            device_id.to_string(),
            Reading {
                device_id: device_id.to_string(),
                timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                inlet_pressure: 0.3,
                outlet_pressure: outlet,
                temperature: 23.0,
                flow_rate: 500.0,
            },
        )
    }

    #[tokio::test]
    async fn one_failing_device_does_not_stop_others() {
        let detector = FlakyDetector {
            inner: ZScoreDetector::new(Arc::new(StaticBaselineProvider), 3.0),
            poison: "dev-2",
        };
        let store = Arc::new(MemoryAlertStore::new());
        let pipeline = Arc::new(Pipeline::new(
            Arc::new(detector),
            Arc::new(StubAnalyzer),
            Arc::new(AlertComposer::new(
                store.clone(),
                Arc::new(MemoryStatusSink::new()),
            )),
            Arc::new(Broadcaster::new()),
        ));

        let batch = vec![
            reading("dev-1", 2.95), // anomalous
            reading("dev-2", 2.95), // detect fails
            reading("dev-3", 2.5),  // nominal
        ];

        let mut states = run_sweep(pipeline, batch).await;
        states.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        assert_eq!(states.len(), 3);

        assert!(states[0].alert.is_some());
        assert!(states[1].error.is_some());
        assert!(states[1].alert.is_none());
        assert!(states[2].error.is_none());
        assert!(states[2].alert.is_none());

        // Only the anomalous device produced a persisted alert.
        assert_eq!(store.alerts().await.len(), 1);
    }
}

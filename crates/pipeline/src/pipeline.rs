//! The four-stage detection pipeline.
//!
//! Stages run strictly in order with conditional skips: every reading
//! is detected; analysis, alert generation, and push only run for
//! anomalous readings. A stage failure is recorded on the state and the
//! run continues — later stages skip naturally when their inputs are
//! absent, so a failed Detect can never fabricate an alert.

use std::sync::Arc;

use tracing::{debug, info, warn};

use regmon_alert::Composer;
use regmon_analysis::CauseAnalyzer;
use regmon_core::Reading;
use regmon_detect::Detector;
use regmon_notify::Broadcaster;

use crate::state::{PipelineState, Stage, StageError, StageSnapshot};

/// One pipeline instance serves all devices; runs are independent and
/// share only read-only baselines/rules and the observer registry.
pub struct Pipeline {
    detector: Arc<dyn Detector>,
    analyzer: Arc<dyn CauseAnalyzer>,
    composer: Arc<dyn Composer>,
    broadcaster: Arc<Broadcaster>,
}

impl Pipeline {
    pub fn new(
        detector: Arc<dyn Detector>,
        analyzer: Arc<dyn CauseAnalyzer>,
        composer: Arc<dyn Composer>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            detector,
            analyzer,
            composer,
            broadcaster,
        }
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Run the full pipeline for one reading.
    pub async fn run(&self, device_id: &str, reading: Reading) -> PipelineState {
        let mut state = PipelineState::new(device_id, reading);
        self.detect_stage(&mut state).await;
        self.analyze_stage(&mut state).await;
        self.alert_stage(&mut state).await;
        self.push_stage(&mut state).await;
        state
    }

    /// Like `run`, but also captures a state snapshot after every stage
    /// transition for an external observability sink. The snapshot
    /// sequence is finite and restarts with each call.
    pub async fn run_traced(
        &self,
        device_id: &str,
        reading: Reading,
    ) -> (PipelineState, Vec<StageSnapshot>) {
        let mut state = PipelineState::new(device_id, reading);
        let mut snapshots = Vec::with_capacity(4);

        self.detect_stage(&mut state).await;
        snapshots.push(StageSnapshot {
            stage: Stage::Detect,
            state: state.clone(),
        });

        self.analyze_stage(&mut state).await;
        snapshots.push(StageSnapshot {
            stage: Stage::Analyze,
            state: state.clone(),
        });

        self.alert_stage(&mut state).await;
        snapshots.push(StageSnapshot {
            stage: Stage::AlertGen,
            state: state.clone(),
        });

        self.push_stage(&mut state).await;
        snapshots.push(StageSnapshot {
            stage: Stage::Push,
            state: state.clone(),
        });

        (state, snapshots)
    }

    async fn detect_stage(&self, state: &mut PipelineState) {
        debug!(device_id = %state.device_id, "detect stage");
        match self.detector.detect(&state.device_id, &state.reading).await {
            Ok(result) => {
                info!(
                    device_id = %state.device_id,
                    is_anomaly = result.is_anomaly,
                    count = result.anomalies.len(),
                    "detection completed"
                );
                state.anomaly_result = Some(result);
            }
            Err(e) => {
                // Recorded, not fatal: the remaining stages skip on the
                // absent result and the sweep keeps the state for triage.
                warn!(device_id = %state.device_id, error = %e, "detect stage failed");
                state.error = Some(StageError {
                    stage: Stage::Detect,
                    message: e.to_string(),
                });
            }
        }
    }

    async fn analyze_stage(&self, state: &mut PipelineState) {
        let Some(result) = &state.anomaly_result else {
            return;
        };
        if !result.is_anomaly {
            debug!(device_id = %state.device_id, "no anomaly, skipping analysis");
            return;
        }
        let root_cause = self.analyzer.analyze(&result.anomalies).await;
        info!(
            device_id = %state.device_id,
            method = ?root_cause.method,
            confidence = root_cause.confidence,
            "root cause resolved"
        );
        state.root_cause = Some(root_cause);
    }

    async fn alert_stage(&self, state: &mut PipelineState) {
        if !state.is_anomalous() {
            debug!(device_id = %state.device_id, "no anomaly, skipping alert generation");
            return;
        }
        let (Some(result), Some(root_cause)) = (&state.anomaly_result, &state.root_cause) else {
            return;
        };
        let alert = self.composer.compose(&state.device_id, result, root_cause).await;
        info!(device_id = %state.device_id, level = %alert.level, "alert generated");
        state.alert = Some(alert);
    }

    async fn push_stage(&self, state: &mut PipelineState) {
        let Some(alert) = &state.alert else {
            debug!(device_id = %state.device_id, "no alert to push");
            return;
        };
        // Fire-and-forget: broadcast failures never roll back the alert.
        let outcome = self.broadcaster.broadcast(alert).await;
        info!(
            device_id = %state.device_id,
            delivered = outcome.delivered,
            pruned = outcome.pruned,
            "alert pushed"
        );
    }
}

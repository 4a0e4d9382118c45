//! Pipeline run state.

use serde::Serialize;

use regmon_core::{Alert, AnomalyResult, Reading, RootCauseResult};

/// The four pipeline stages, in fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Detect,
    Analyze,
    AlertGen,
    Push,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Detect => f.write_str("detect"),
            Stage::Analyze => f.write_str("analyze"),
            Stage::AlertGen => f.write_str("alert-gen"),
            Stage::Push => f.write_str("push"),
        }
    }
}

/// A failure recorded by a stage. The run continues past it; later
/// stages skip themselves when their inputs are absent.
#[derive(Debug, Clone, Serialize)]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
}

/// The value threaded through one pipeline run. Each stage fills in its
/// own slot; a run is single-threaded, so no slot is written twice.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    pub device_id: String,
    pub reading: Reading,
    pub anomaly_result: Option<AnomalyResult>,
    pub root_cause: Option<RootCauseResult>,
    pub alert: Option<Alert>,
    pub error: Option<StageError>,
}

impl PipelineState {
    pub fn new(device_id: impl Into<String>, reading: Reading) -> Self {
        Self {
            device_id: device_id.into(),
            reading,
            anomaly_result: None,
            root_cause: None,
            alert: None,
            error: None,
        }
    }

    /// Whether detection flagged this reading.
    pub fn is_anomalous(&self) -> bool {
        self.anomaly_result
            .as_ref()
            .map(|r| r.is_anomaly)
            .unwrap_or(false)
    }
}

/// State observed right after one stage transition.
#[derive(Debug, Clone, Serialize)]
pub struct StageSnapshot {
    pub stage: Stage,
    pub state: PipelineState,
}

//! Shared data model for the detection → root-cause → alerting pipeline.
//!
//! Field names serialize in camelCase to stay wire-compatible with the
//! ingestion and dashboard collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Metrics ─────────────────────────────────────────────────────────

/// The four metrics sampled from every regulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    InletPressure,
    OutletPressure,
    Temperature,
    FlowRate,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::InletPressure,
        Metric::OutletPressure,
        Metric::Temperature,
        Metric::FlowRate,
    ];

    /// Wire name, as used in readings and alert payloads.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::InletPressure => "inletPressure",
            Metric::OutletPressure => "outletPressure",
            Metric::Temperature => "temperature",
            Metric::FlowRate => "flowRate",
        }
    }

    /// Human-readable name for alert messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::InletPressure => "inlet pressure",
            Metric::OutletPressure => "outlet pressure",
            Metric::Temperature => "temperature",
            Metric::FlowRate => "flow rate",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ── Readings ────────────────────────────────────────────────────────

/// One timestamped multi-metric sample from a device. Immutable once
/// captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub inlet_pressure: f64,
    pub outlet_pressure: f64,
    pub temperature: f64,
    pub flow_rate: f64,
}

impl Reading {
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::InletPressure => self.inlet_pressure,
            Metric::OutletPressure => self.outlet_pressure,
            Metric::Temperature => self.temperature,
            Metric::FlowRate => self.flow_rate,
        }
    }
}

// ── Baselines ───────────────────────────────────────────────────────

/// Per-metric reference statistics. `std == 0` is valid (constant
/// signal) and must never be divided by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    pub std: f64,
}

/// Per-device baseline, read-only outside the baseline provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineStats {
    pub device_id: String,
    pub inlet_pressure: MetricStats,
    pub outlet_pressure: MetricStats,
    pub temperature: MetricStats,
    pub flow_rate: MetricStats,
    pub sample_size: usize,
    pub updated_at: DateTime<Utc>,
}

impl BaselineStats {
    pub fn stats(&self, metric: Metric) -> MetricStats {
        match metric {
            Metric::InletPressure => self.inlet_pressure,
            Metric::OutletPressure => self.outlet_pressure,
            Metric::Temperature => self.temperature,
            Metric::FlowRate => self.flow_rate,
        }
    }
}

// ── Detection results ───────────────────────────────────────────────

/// One metric whose z-score exceeded the detection threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub metric: Metric,
    pub value: f64,
    /// Baseline mean the value was judged against.
    pub baseline: f64,
    pub z_score: f64,
    /// Percent deviation from the baseline mean. Defined as 0.0 when the
    /// baseline mean is 0 (an unguarded division would feed ±inf/NaN into
    /// JSON alert payloads).
    pub deviation: f64,
}

/// Outcome of scoring one reading. Transient; only alerts are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyResult {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub is_anomaly: bool,
    pub anomalies: Vec<Anomaly>,
    pub severity: AlertLevel,
}

// ── Root cause ──────────────────────────────────────────────────────

/// How a root cause was attributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMethod {
    RuleBased,
    FallbackReasoning,
}

/// Root-cause attribution for an anomaly set.
///
/// Confidence is fixed by construction: 0.8 for a rule match, 0.6 for
/// successful fallback reasoning, 0.3 for the degraded default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootCauseResult {
    pub cause: String,
    pub recommendation: String,
    pub confidence: f64,
    pub method: AnalysisMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

// ── Alerts ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Warning,
    Critical,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertLevel::Warning => f.write_str("WARNING"),
            AlertLevel::Critical => f.write_str("CRITICAL"),
        }
    }
}

/// The user-facing alert record. Created once per anomalous run;
/// `id` is assigned by the persistence collaborator on successful
/// storage and stays `None` when storage fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub device_id: String,
    pub level: AlertLevel,
    pub message: String,
    pub anomalies: Vec<Anomaly>,
    pub root_cause: RootCauseResult,
    pub created_at: DateTime<Utc>,
}

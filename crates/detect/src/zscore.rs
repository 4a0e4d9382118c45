//! Z-score anomaly detection against a per-device baseline.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use regmon_core::{
    determine_alert_level, Anomaly, AnomalyResult, BaselineStats, Metric, Reading,
};

use crate::baseline::BaselineProvider;

/// Default z-score detection threshold.
pub const DEFAULT_THRESHOLD: f64 = 3.0;

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("detector failure: {0}")]
    Internal(String),
}

/// Scores a reading against its device baseline.
///
/// The z-score detector itself never fails; the error type exists for
/// alternative detector implementations behind the same seam.
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect(&self, device_id: &str, reading: &Reading)
        -> Result<AnomalyResult, DetectError>;
}

/// Standardized deviation from the baseline mean.
///
/// By convention a zero std yields a zero score: a constant baseline can
/// never register an anomaly through this path, and NaN/infinity stay
/// out of the arithmetic.
pub fn z_score(value: f64, mean: f64, std: f64) -> f64 {
    if std == 0.0 {
        return 0.0;
    }
    ((value - mean) / std).abs()
}

fn deviation_percent(value: f64, mean: f64) -> f64 {
    if mean == 0.0 {
        return 0.0;
    }
    (value - mean) / mean * 100.0
}

/// Per-metric z-score detector. Pure given a baseline: one baseline
/// lookup, then arithmetic only, deterministic for identical inputs.
pub struct ZScoreDetector {
    baselines: Arc<dyn BaselineProvider>,
    threshold: f64,
}

impl ZScoreDetector {
    pub fn new(baselines: Arc<dyn BaselineProvider>, threshold: f64) -> Self {
        Self {
            baselines,
            threshold,
        }
    }

    fn score(&self, reading: &Reading, baseline: &BaselineStats) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();

        for metric in Metric::ALL {
            let value = reading.metric(metric);
            let stats = baseline.stats(metric);
            let score = z_score(value, stats.mean, stats.std);
            debug!(metric = %metric, score, threshold = self.threshold, "scored metric");

            if score > self.threshold {
                anomalies.push(Anomaly {
                    metric,
                    value,
                    baseline: stats.mean,
                    z_score: score,
                    deviation: deviation_percent(value, stats.mean),
                });
            }
        }

        anomalies
    }
}

#[async_trait]
impl Detector for ZScoreDetector {
    async fn detect(
        &self,
        device_id: &str,
        reading: &Reading,
    ) -> Result<AnomalyResult, DetectError> {
        let baseline = self.baselines.baseline(device_id).await;
        let anomalies = self.score(reading, &baseline);

        let is_anomaly = !anomalies.is_empty();
        let severity = determine_alert_level(&anomalies);

        if is_anomaly {
            warn!(
                device_id,
                count = anomalies.len(),
                severity = %severity,
                "anomalous reading"
            );
            for a in &anomalies {
                warn!(
                    device_id,
                    metric = %a.metric,
                    value = a.value,
                    baseline = a.baseline,
                    z_score = format!("{:.2}", a.z_score),
                    "metric above threshold"
                );
            }
        } else {
            debug!(device_id, "reading within baseline");
        }

        Ok(AnomalyResult {
            device_id: device_id.to_string(),
            timestamp: reading.timestamp,
            is_anomaly,
            anomalies,
            severity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::StaticBaselineProvider;
    use chrono::{TimeZone, Utc};
    use regmon_core::AlertLevel;

    fn detector() -> ZScoreDetector {
        ZScoreDetector::new(Arc::new(StaticBaselineProvider), DEFAULT_THRESHOLD)
    }

    fn reading(inlet: f64, outlet: f64, temp: f64, flow: f64) -> Reading {
        Reading {
            device_id: "dev-1".into(),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            inlet_pressure: inlet,
            outlet_pressure: outlet,
            temperature: temp,
            flow_rate: flow,
        }
    }

    #[test]
    fn z_score_examples() {
        assert_eq!(z_score(10.0, 5.0, 2.0), 2.5);
        assert_eq!(z_score(2.0, 5.0, 2.0), 1.5);
    }

    #[test]
    fn zero_std_never_scores() {
        assert_eq!(z_score(1_000_000.0, 0.0, 0.0), 0.0);
        assert_eq!(z_score(-42.0, 7.0, 0.0), 0.0);
    }

    #[test]
    fn deviation_is_zero_for_zero_mean() {
        assert_eq!(deviation_percent(12.0, 0.0), 0.0);
        assert!((deviation_percent(3.0, 2.0) - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn nominal_reading_has_no_anomalies() {
        // Default baseline: inlet (0.3, 0.02), outlet (2.5, 0.1),
        // temperature (23, 2), flow (500, 20).
        let result = detector()
            .detect("dev-1", &reading(0.3, 2.5, 23.0, 500.0))
            .await
            .unwrap();
        assert!(!result.is_anomaly);
        assert!(result.anomalies.is_empty());
        assert_eq!(result.severity, AlertLevel::Warning);
    }

    #[tokio::test]
    async fn single_excursion_is_flagged_with_deviation() {
        // Outlet 2.95 → z = |2.95 - 2.5| / 0.1 = 4.5, deviation 18%.
        let result = detector()
            .detect("dev-1", &reading(0.3, 2.95, 23.0, 500.0))
            .await
            .unwrap();
        assert!(result.is_anomaly);
        assert_eq!(result.anomalies.len(), 1);

        let a = &result.anomalies[0];
        assert_eq!(a.metric, Metric::OutletPressure);
        assert!((a.z_score - 4.5).abs() < 1e-9);
        assert!((a.deviation - 18.0).abs() < 1e-9);
        assert_eq!(result.severity, AlertLevel::Warning);
    }

    #[tokio::test]
    async fn severity_follows_alert_level_policy() {
        // Three metrics out of range → CRITICAL by count.
        let result = detector()
            .detect("dev-1", &reading(0.4, 2.95, 30.0, 500.0))
            .await
            .unwrap();
        assert_eq!(result.anomalies.len(), 3);
        assert_eq!(result.severity, AlertLevel::Critical);
    }

    #[tokio::test]
    async fn detection_is_deterministic() {
        let r = reading(0.4, 2.95, 30.0, 620.0);
        let first = detector().detect("dev-1", &r).await.unwrap();
        let second = detector().detect("dev-1", &r).await.unwrap();
        assert_eq!(first, second);
    }
}

//! Alert-level policy.
//!
//! The level is a pure function of the anomaly set and is never set
//! independently: more than two anomalous metrics, or any z-score above
//! 5, escalates to CRITICAL. Both the detector's severity field and the
//! alert composer go through this one function.

use crate::types::{AlertLevel, Anomaly};

/// Z-score above which a single anomaly alone is CRITICAL.
const CRITICAL_ZSCORE: f64 = 5.0;
/// Anomaly count above which the set is CRITICAL.
const CRITICAL_COUNT: usize = 2;

pub fn determine_alert_level(anomalies: &[Anomaly]) -> AlertLevel {
    if anomalies.is_empty() {
        return AlertLevel::Warning;
    }

    let max_z_score = anomalies.iter().map(|a| a.z_score).fold(f64::MIN, f64::max);

    if anomalies.len() > CRITICAL_COUNT || max_z_score > CRITICAL_ZSCORE {
        AlertLevel::Critical
    } else {
        AlertLevel::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metric;

    fn anomaly(metric: Metric, z_score: f64) -> Anomaly {
        Anomaly {
            metric,
            value: 0.0,
            baseline: 0.0,
            z_score,
            deviation: 0.0,
        }
    }

    #[test]
    fn empty_set_is_warning() {
        assert_eq!(determine_alert_level(&[]), AlertLevel::Warning);
    }

    #[test]
    fn single_moderate_anomaly_is_warning() {
        let anomalies = [anomaly(Metric::Temperature, 3.2)];
        assert_eq!(determine_alert_level(&anomalies), AlertLevel::Warning);
    }

    #[test]
    fn high_z_score_escalates_to_critical() {
        let anomalies = [anomaly(Metric::OutletPressure, 5.5)];
        assert_eq!(determine_alert_level(&anomalies), AlertLevel::Critical);
    }

    #[test]
    fn boundary_z_score_of_five_stays_warning() {
        let anomalies = [anomaly(Metric::OutletPressure, 5.0)];
        assert_eq!(determine_alert_level(&anomalies), AlertLevel::Warning);
    }

    #[test]
    fn three_anomalies_escalate_to_critical() {
        let anomalies = [
            anomaly(Metric::InletPressure, 3.5),
            anomaly(Metric::OutletPressure, 3.2),
            anomaly(Metric::Temperature, 3.8),
        ];
        assert_eq!(determine_alert_level(&anomalies), AlertLevel::Critical);
    }

    #[test]
    fn two_moderate_anomalies_stay_warning() {
        let anomalies = [
            anomaly(Metric::InletPressure, 3.5),
            anomaly(Metric::FlowRate, 4.0),
        ];
        assert_eq!(determine_alert_level(&anomalies), AlertLevel::Warning);
    }
}

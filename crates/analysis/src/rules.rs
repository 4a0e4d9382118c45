//! Failure-signature rule catalog.
//!
//! Rules are constructed once at startup and never mutated. Matching is
//! deterministic: rules are held in ascending priority order (1 =
//! highest precedence) and the first predicate that holds over the
//! anomaly set wins.

use regmon_core::{Anomaly, Metric};

/// One failure signature: a predicate over the anomaly set plus the
/// attributed cause and recommendation.
pub struct Rule {
    pub id: &'static str,
    /// Ascending precedence, 1 matches first.
    pub priority: u32,
    predicate: fn(&[Anomaly]) -> bool,
    pub cause: &'static str,
    pub recommendation: &'static str,
}

impl Rule {
    pub fn matches(&self, anomalies: &[Anomaly]) -> bool {
        (self.predicate)(anomalies)
    }
}

/// Immutable, priority-ordered rule list.
pub struct RuleCatalog {
    rules: Vec<Rule>,
}

impl RuleCatalog {
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|r| r.priority);
        Self { rules }
    }

    /// The built-in regulator failure signatures.
    pub fn builtin() -> Self {
        Self::new(vec![
            Rule {
                id: "rule-001",
                priority: 1,
                predicate: |anomalies| {
                    anomalies
                        .iter()
                        .any(|a| a.metric == Metric::OutletPressure && a.z_score > 4.0)
                },
                cause: "Regulator diaphragm likely aged or damaged",
                recommendation:
                    "Inspect and replace the diaphragm immediately; take the unit out of service",
            },
            Rule {
                id: "rule-002",
                priority: 2,
                predicate: |anomalies| {
                    anomalies
                        .iter()
                        .any(|a| a.metric == Metric::Temperature && a.value > 60.0)
                },
                cause: "Abnormal unit temperature; the valve may be seized",
                recommendation: "Check valve lubrication and clean the valve assembly",
            },
            Rule {
                id: "rule-003",
                priority: 3,
                predicate: |anomalies| {
                    anomalies
                        .iter()
                        .any(|a| a.metric == Metric::InletPressure && a.z_score > 4.0)
                },
                cause: "Inlet pressure fluctuating abnormally; upstream supply may be unstable",
                recommendation:
                    "Inspect upstream piping and the supply system; contact the gas supplier",
            },
            Rule {
                id: "rule-004",
                priority: 4,
                predicate: |anomalies| {
                    anomalies
                        .iter()
                        .any(|a| a.metric == Metric::FlowRate && a.z_score > 4.0)
                },
                cause: "Abnormal flow; possible pipeline leak or sudden demand increase",
                recommendation: "Check pipeline integrity and survey downstream consumption",
            },
            Rule {
                id: "rule-005",
                priority: 5,
                predicate: |anomalies| {
                    let outlet = anomalies
                        .iter()
                        .find(|a| a.metric == Metric::OutletPressure);
                    let temp = anomalies.iter().find(|a| a.metric == Metric::Temperature);
                    matches!((outlet, temp), (Some(o), Some(t)) if o.z_score > 3.0 && t.z_score > 3.0)
                },
                cause:
                    "Outlet pressure and temperature anomalous together; likely a regulator-wide fault",
                recommendation:
                    "Shut the unit down for overhaul and replace the regulator's core components",
            },
        ])
    }

    /// First rule (in priority order) whose predicate holds.
    pub fn first_match(&self, anomalies: &[Anomaly]) -> Option<&Rule> {
        self.rules.iter().find(|r| r.matches(anomalies))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anomaly(metric: Metric, value: f64, z_score: f64) -> Anomaly {
        Anomaly {
            metric,
            value,
            baseline: 0.0,
            z_score,
            deviation: 0.0,
        }
    }

    #[test]
    fn builtin_catalog_is_priority_sorted() {
        let catalog = RuleCatalog::builtin();
        let priorities: Vec<u32> = catalog.rules().iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn outlet_excursion_matches_highest_priority_rule() {
        let catalog = RuleCatalog::builtin();
        let anomalies = [anomaly(Metric::OutletPressure, 3.0, 4.5)];
        let rule = catalog.first_match(&anomalies).unwrap();
        assert_eq!(rule.id, "rule-001");
    }

    #[test]
    fn higher_priority_rule_wins_when_several_match() {
        let catalog = RuleCatalog::builtin();
        // rule-001 (outlet z > 4) and rule-002 (temperature > 60) both hold;
        // the lower priority number must win.
        let anomalies = [
            anomaly(Metric::OutletPressure, 3.0, 4.5),
            anomaly(Metric::Temperature, 70.0, 3.5),
        ];
        let rule = catalog.first_match(&anomalies).unwrap();
        assert_eq!(rule.id, "rule-001");
    }

    #[test]
    fn compound_signature_needs_both_metrics() {
        let catalog = RuleCatalog::builtin();
        // Neither metric trips its single-metric rule (outlet z <= 4,
        // temperature <= 60), but together they match rule-005.
        let anomalies = [
            anomaly(Metric::OutletPressure, 2.9, 3.5),
            anomaly(Metric::Temperature, 30.0, 3.5),
        ];
        let rule = catalog.first_match(&anomalies).unwrap();
        assert_eq!(rule.id, "rule-005");

        let outlet_only = [anomaly(Metric::OutletPressure, 2.9, 3.5)];
        assert!(catalog.first_match(&outlet_only).is_none());
    }

    #[test]
    fn unmatched_set_falls_through() {
        let catalog = RuleCatalog::builtin();
        let anomalies = [anomaly(Metric::InletPressure, 0.35, 3.5)];
        assert!(catalog.first_match(&anomalies).is_none());
    }
}

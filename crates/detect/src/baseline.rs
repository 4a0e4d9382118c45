//! Per-device baseline statistics.
//!
//! `BaselineProvider::baseline` never fails: when no data-derived
//! baseline is available (empty history, store outage, cold cache) it
//! falls back to the fixed default baseline, so detection keeps a
//! stable reference that prior anomalous readings cannot pollute.
//! Only the explicit `recompute` path surfaces `NoData`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use regmon_core::{BaselineStats, Metric, MetricStats, Reading, StoreError};

/// Default sample size for baseline recomputation.
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum BaselineError {
    /// The device has no historical readings to compute from. Raised
    /// only by `recompute`; `baseline` always has the static fallback.
    #[error("no historical readings for device '{0}'")]
    NoData(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ── Collaborator seams ──────────────────────────────────────────────

/// Historical-readings query, newest-first.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn query_recent(&self, device_id: &str, n: usize) -> Result<Vec<Reading>, StoreError>;
}

/// Best-effort baseline cache. Failures are logged by callers and never
/// affect the returned baseline.
#[async_trait]
pub trait BaselineCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl_secs: u64)
        -> Result<(), StoreError>;
}

/// Supplies the per-metric (mean, std) reference for a device.
#[async_trait]
pub trait BaselineProvider: Send + Sync {
    /// Never fails; see module docs for the fallback chain.
    async fn baseline(&self, device_id: &str) -> BaselineStats;
}

// ── Default baseline ────────────────────────────────────────────────

/// Fixed baseline derived from normal regulator operating parameters.
pub fn default_baseline(device_id: &str) -> BaselineStats {
    BaselineStats {
        device_id: device_id.to_string(),
        inlet_pressure: MetricStats { mean: 0.3, std: 0.02 },
        outlet_pressure: MetricStats { mean: 2.5, std: 0.1 },
        temperature: MetricStats { mean: 23.0, std: 2.0 },
        flow_rate: MetricStats { mean: 500.0, std: 20.0 },
        sample_size: 0,
        updated_at: Utc::now(),
    }
}

/// Always returns the fixed default baseline, keeping the detection
/// reference independent of (possibly anomalous) history.
pub struct StaticBaselineProvider;

#[async_trait]
impl BaselineProvider for StaticBaselineProvider {
    async fn baseline(&self, device_id: &str) -> BaselineStats {
        debug!(device_id, "using default baseline");
        default_baseline(device_id)
    }
}

// ── Cache-backed provider ───────────────────────────────────────────

/// Baseline provider that recomputes from recent history and caches the
/// result with a bounded TTL. Falls back to the default baseline when
/// neither cache nor history can produce one.
pub struct CachingBaselineProvider {
    store: Arc<dyn ReadingStore>,
    cache: Arc<dyn BaselineCache>,
    sample_size: usize,
    cache_ttl_secs: u64,
}

impl CachingBaselineProvider {
    pub fn new(
        store: Arc<dyn ReadingStore>,
        cache: Arc<dyn BaselineCache>,
        sample_size: usize,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            store,
            cache,
            sample_size,
            cache_ttl_secs,
        }
    }

    fn cache_key(device_id: &str) -> String {
        format!("baseline:{device_id}")
    }

    /// Recompute the baseline from the most recent readings.
    ///
    /// Surfaces `NoData` for a device with no historical rows. The cache
    /// write is best-effort.
    pub async fn recompute(&self, device_id: &str) -> Result<BaselineStats, BaselineError> {
        let readings = self.store.query_recent(device_id, self.sample_size).await?;
        if readings.is_empty() {
            return Err(BaselineError::NoData(device_id.to_string()));
        }

        let stats_for = |metric: Metric| {
            let values: Vec<f64> = readings.iter().map(|r| r.metric(metric)).collect();
            compute_metric_stats(&values)
        };

        let baseline = BaselineStats {
            device_id: device_id.to_string(),
            inlet_pressure: stats_for(Metric::InletPressure),
            outlet_pressure: stats_for(Metric::OutletPressure),
            temperature: stats_for(Metric::Temperature),
            flow_rate: stats_for(Metric::FlowRate),
            sample_size: readings.len(),
            updated_at: Utc::now(),
        };

        info!(
            device_id,
            sample_size = baseline.sample_size,
            "recomputed baseline"
        );

        match serde_json::to_vec(&baseline) {
            Ok(bytes) => {
                if let Err(e) = self
                    .cache
                    .set_with_ttl(&Self::cache_key(device_id), bytes, self.cache_ttl_secs)
                    .await
                {
                    warn!(device_id, error = %e, "baseline cache write failed");
                }
            }
            Err(e) => warn!(device_id, error = %e, "baseline serialization failed"),
        }

        Ok(baseline)
    }

    async fn cached(&self, device_id: &str) -> Option<BaselineStats> {
        let bytes = match self.cache.get(&Self::cache_key(device_id)).await {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!(device_id, error = %e, "baseline cache read failed");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(baseline) => Some(baseline),
            Err(e) => {
                warn!(device_id, error = %e, "stale baseline cache entry ignored");
                None
            }
        }
    }
}

#[async_trait]
impl BaselineProvider for CachingBaselineProvider {
    async fn baseline(&self, device_id: &str) -> BaselineStats {
        if let Some(baseline) = self.cached(device_id).await {
            debug!(device_id, "baseline cache hit");
            return baseline;
        }

        match self.recompute(device_id).await {
            Ok(baseline) => baseline,
            Err(BaselineError::NoData(_)) => {
                debug!(device_id, "no history, using default baseline");
                default_baseline(device_id)
            }
            Err(e) => {
                warn!(device_id, error = %e, "baseline recompute failed, using default");
                default_baseline(device_id)
            }
        }
    }
}

/// Single-pass mean/std. An empty sample yields (0, 0).
fn compute_metric_stats(values: &[f64]) -> MetricStats {
    if values.is_empty() {
        return MetricStats { mean: 0.0, std: 0.0 };
    }

    let n = values.len() as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for v in values {
        sum += v;
        sum_sq += v * v;
    }
    let mean = sum / n;
    // Population variance; floating error can push it fractionally negative.
    let variance = (sum_sq / n - mean * mean).max(0.0);

    MetricStats {
        mean,
        std: variance.sqrt(),
    }
}

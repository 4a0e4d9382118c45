//! In-memory collaborator implementations, used by tests and the
//! pipeline worker. Production deployments plug real store/cache
//! backends into the same traits.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use regmon_core::{Reading, StoreError};

use crate::baseline::{BaselineCache, ReadingStore};

// ── Readings ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryReadingStore {
    readings: RwLock<HashMap<String, Vec<Reading>>>,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, reading: Reading) {
        let mut readings = self.readings.write().await;
        readings
            .entry(reading.device_id.clone())
            .or_default()
            .push(reading);
    }
}

#[async_trait]
impl ReadingStore for MemoryReadingStore {
    async fn query_recent(&self, device_id: &str, n: usize) -> Result<Vec<Reading>, StoreError> {
        let readings = self.readings.read().await;
        let mut rows: Vec<Reading> = readings.get(device_id).cloned().unwrap_or_default();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.truncate(n);
        Ok(rows)
    }
}

// ── Cache ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaselineCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).and_then(|(bytes, expires_at)| {
            if Instant::now() < *expires_at {
                Some(bytes.clone())
            } else {
                None
            }
        }))
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            (value, Instant::now() + Duration::from_secs(ttl_secs)),
        );
        Ok(())
    }
}

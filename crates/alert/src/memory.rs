//! In-memory persistence collaborators for tests and workers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use regmon_core::{Alert, AlertLevel, StoreError};

use crate::composer::{AlertStore, DeviceStatusSink};

#[derive(Default)]
pub struct MemoryAlertStore {
    alerts: RwLock<Vec<Alert>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.alerts.read().await.clone()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn insert(&self, alert: &Alert) -> Result<Alert, StoreError> {
        let stored = Alert {
            id: Some(Uuid::new_v4()),
            created_at: Utc::now(),
            ..alert.clone()
        };
        self.alerts.write().await.push(stored.clone());
        Ok(stored)
    }
}

#[derive(Default)]
pub struct MemoryStatusSink {
    statuses: RwLock<HashMap<String, AlertLevel>>,
}

impl MemoryStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn status_of(&self, device_id: &str) -> Option<AlertLevel> {
        self.statuses.read().await.get(device_id).copied()
    }
}

#[async_trait]
impl DeviceStatusSink for MemoryStatusSink {
    async fn update_status(&self, device_id: &str, level: AlertLevel) -> Result<(), StoreError> {
        self.statuses
            .write()
            .await
            .insert(device_id.to_string(), level);
        Ok(())
    }
}

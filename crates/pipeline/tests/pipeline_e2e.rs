//! End-to-end pipeline runs over the real components, with the
//! reasoning provider and observers mocked at their seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Mutex;

use regmon_alert::{AlertComposer, MemoryAlertStore, MemoryStatusSink};
use regmon_analysis::{RootCauseResolver, RuleCatalog};
use regmon_core::{AlertLevel, AnalysisMethod, Reading};
use regmon_detect::{StaticBaselineProvider, ZScoreDetector};
use regmon_llm::{LlmError, LlmProvider, Prompt};
use regmon_notify::{Broadcaster, Observer, SendError};
use regmon_pipeline::{run_sweep, Pipeline};

struct CannedProvider {
    response: String,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LlmProvider for CannedProvider {
    async fn complete(
        &self,
        _prompt: &Prompt,
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

struct RecordingObserver {
    frames: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Observer for RecordingObserver {
    async fn send(&self, frame: &str) -> Result<(), SendError> {
        self.frames.lock().await.push(frame.to_string());
        Ok(())
    }
}

fn reading(device_id: &str, outlet: f64, temp: f64) -> Reading {
    Reading {
        device_id: device_id.to_string(),
        timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        inlet_pressure: 0.3,
        outlet_pressure: outlet,
        temperature: temp,
        flow_rate: 500.0,
    }
}

fn build_pipeline(
    llm_response: &str,
    llm_calls: Arc<AtomicUsize>,
    store: Arc<MemoryAlertStore>,
    status: Arc<MemoryStatusSink>,
    broadcaster: Arc<Broadcaster>,
) -> Pipeline {
    let detector = ZScoreDetector::new(Arc::new(StaticBaselineProvider), 3.0);
    let resolver = RootCauseResolver::new(
        RuleCatalog::builtin(),
        Box::new(CannedProvider {
            response: llm_response.to_string(),
            calls: llm_calls,
        }),
        0.3,
        1024,
        Duration::from_secs(30),
    );
    Pipeline::new(
        Arc::new(detector),
        Arc::new(resolver),
        Arc::new(AlertComposer::new(store, status)),
        broadcaster,
    )
}

#[tokio::test]
async fn rule_matched_anomaly_flows_to_observers() {
    let llm_calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(MemoryAlertStore::new());
    let status = Arc::new(MemoryStatusSink::new());
    let broadcaster = Arc::new(Broadcaster::new());
    let frames = Arc::new(Mutex::new(Vec::new()));
    broadcaster
        .register(
            "dashboard",
            Box::new(RecordingObserver {
                frames: frames.clone(),
            }),
        )
        .await;

    let pipeline = build_pipeline("{}", llm_calls.clone(), store.clone(), status.clone(), broadcaster);

    // Outlet 2.95 → z = 4.5: anomalous, matches rule-001 (no LLM call).
    let state = pipeline.run("dev-1", reading("dev-1", 2.95, 23.0)).await;

    let root_cause = state.root_cause.as_ref().unwrap();
    assert_eq!(root_cause.method, AnalysisMethod::RuleBased);
    assert_eq!(root_cause.rule_id.as_deref(), Some("rule-001"));
    assert_eq!(llm_calls.load(Ordering::SeqCst), 0);

    let alert = state.alert.as_ref().unwrap();
    assert!(alert.id.is_some());
    assert_eq!(alert.level, AlertLevel::Warning);
    assert!(alert.message.contains("outlet pressure"));

    assert_eq!(store.alerts().await.len(), 1);
    assert_eq!(status.status_of("dev-1").await, Some(AlertLevel::Warning));

    // Alert frame plus device-status frame.
    let frames = frames.lock().await;
    assert_eq!(frames.len(), 2);
    let alert_frame: serde_json::Value = serde_json::from_str(&frames[0]).unwrap();
    assert_eq!(alert_frame["type"], "alert");
    assert_eq!(alert_frame["data"]["deviceId"], "dev-1");
    let status_frame: serde_json::Value = serde_json::from_str(&frames[1]).unwrap();
    assert_eq!(status_frame["type"], "device-status");
}

#[tokio::test]
async fn unmatched_anomaly_uses_fallback_reasoning() {
    let llm_calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(MemoryAlertStore::new());
    let status = Arc::new(MemoryStatusSink::new());
    let pipeline = build_pipeline(
        r#"{"cause": "Sensor calibration drift", "recommendation": "Recalibrate the temperature probe", "riskLevel": "low"}"#,
        llm_calls.clone(),
        store.clone(),
        status,
        Arc::new(Broadcaster::new()),
    );

    // Temperature 29.5 → z = 3.25: anomalous, but below every rule
    // threshold (value <= 60, z <= 4, no compound partner).
    let state = pipeline.run("dev-1", reading("dev-1", 2.5, 29.5)).await;

    let root_cause = state.root_cause.as_ref().unwrap();
    assert_eq!(root_cause.method, AnalysisMethod::FallbackReasoning);
    assert_eq!(root_cause.confidence, 0.6);
    assert_eq!(root_cause.cause, "Sensor calibration drift");
    assert_eq!(llm_calls.load(Ordering::SeqCst), 1);

    let alert = state.alert.as_ref().unwrap();
    assert!(alert.message.ends_with("Sensor calibration drift"));
}

#[tokio::test]
async fn sweep_processes_devices_independently() {
    let store = Arc::new(MemoryAlertStore::new());
    let pipeline = Arc::new(build_pipeline(
        "{}",
        Arc::new(AtomicUsize::new(0)),
        store.clone(),
        Arc::new(MemoryStatusSink::new()),
        Arc::new(Broadcaster::new()),
    ));

    let batch = vec![
        ("dev-1".to_string(), reading("dev-1", 2.95, 23.0)),
        ("dev-2".to_string(), reading("dev-2", 2.5, 23.0)),
        ("dev-3".to_string(), reading("dev-3", 2.95, 23.0)),
    ];

    let states = run_sweep(pipeline, batch).await;
    assert_eq!(states.len(), 3);
    assert_eq!(states.iter().filter(|s| s.alert.is_some()).count(), 2);
    assert_eq!(store.alerts().await.len(), 2);
}

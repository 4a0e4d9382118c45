//! Baseline statistics and z-score anomaly detection.
//!
//! This crate provides:
//! - `BaselineProvider` trait with static-default and cache-backed impls
//! - `ReadingStore` / `BaselineCache` seams for the persistence collaborators
//! - `ZScoreDetector` scoring readings against per-device baselines
//! - In-memory store/cache implementations for tests and workers

pub mod baseline;
pub mod memory;
pub mod zscore;

pub use baseline::{
    default_baseline, BaselineCache, BaselineError, BaselineProvider, CachingBaselineProvider,
    ReadingStore, StaticBaselineProvider,
};
pub use memory::{MemoryCache, MemoryReadingStore};
pub use zscore::{z_score, DetectError, Detector, ZScoreDetector};

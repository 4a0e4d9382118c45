//! Alert composition, level policy, and persistence hand-off.
//!
//! This crate provides:
//! - `AlertComposer`: renders the alert message, applies the level
//!   policy, and hands the alert to the persistence collaborator
//! - `AlertStore` / `DeviceStatusSink` seams (failures logged, never
//!   propagated — the in-memory alert always survives)
//! - In-memory store/sink implementations for tests and workers

pub mod composer;
pub mod memory;

pub use composer::{AlertComposer, AlertStore, Composer, DeviceStatusSink};
pub use memory::{MemoryAlertStore, MemoryStatusSink};
pub use regmon_core::policy::determine_alert_level;

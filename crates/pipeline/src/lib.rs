//! Per-device detection pipeline orchestration.
//!
//! This crate provides:
//! - `Pipeline`: the four-stage Detect → Analyze → AlertGen → Push run
//!   with conditional skips, wired by constructor injection
//! - `PipelineState`: the value threaded through the stages, with
//!   per-stage error recording
//! - `run_traced` for per-stage state snapshots (observability)
//! - `run_sweep` for concurrent multi-device processing with per-device
//!   failure isolation

pub mod pipeline;
pub mod state;
pub mod sweep;

pub use pipeline::Pipeline;
pub use state::{PipelineState, Stage, StageError, StageSnapshot};
pub use sweep::run_sweep;

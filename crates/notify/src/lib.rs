//! Best-effort alert fan-out to live observers.
//!
//! This crate provides:
//! - `Observer` trait for connection handles (the concrete socket
//!   transport lives with the collaborator that accepts connections)
//! - `Broadcaster`: concurrency-safe connection registry with
//!   partial-failure isolation and dead-connection pruning
//! - JSON message frames in the `{"type", "data"}` envelope

pub mod broadcaster;
pub mod frames;

pub use broadcaster::{BroadcastOutcome, Broadcaster, Observer, SendError};
pub use frames::{alert_frame, device_status_frame};

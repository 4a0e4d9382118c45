//! Reasoning-service client for fallback root-cause analysis.
//!
//! This crate provides:
//! - `LlmProvider` trait with a single bounded `complete` call
//! - OpenAI-compatible and Ollama backends
//! - `create_provider` factory driven by config
//!
//! Timeout enforcement lives with the caller (the root-cause resolver),
//! which races `complete` against its deadline.

pub mod provider;
pub mod providers;

pub use provider::{LlmError, LlmProvider, Prompt};
pub use providers::create_provider;

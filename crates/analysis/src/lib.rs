//! Root-cause attribution for anomaly sets.
//!
//! This crate provides:
//! - An immutable, priority-ordered rule catalog with the built-in
//!   regulator failure signatures
//! - `RootCauseResolver`: rule matching first, bounded LLM reasoning as
//!   fallback, degrading to a fixed default on timeout/parse/transport
//!   failure — the public contract never errors

pub mod resolver;
pub mod rules;

pub use resolver::{CauseAnalyzer, RootCauseResolver};
pub use rules::{Rule, RuleCatalog};

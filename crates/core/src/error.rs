use thiserror::Error;

/// Failures from external collaborators (readings store, baseline cache,
/// alert persistence, device-status sink).
///
/// These are expected failure modes: callers log them and continue with
/// in-memory data rather than propagating them up the pipeline.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialize(e.to_string())
    }
}

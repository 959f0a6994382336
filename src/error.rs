//! Error types for K9 Flux
//!
//! Malformed spreadsheet rows never surface here: they resolve to defaults or
//! are dropped during ingestion. Only the store boundary and the rapid-entry
//! form can fail.

use thiserror::Error;

/// Errors raised while talking to the remote spreadsheet store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("Fetch body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Unexpected HTTP status on fetch: {0}")]
    Status(u16),
}

/// Validation failures in the rapid-entry form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("At least one reinforcer must be selected")]
    NoReinforcer,

    #[error("Learning units (UA C and UA I) are required for training sessions")]
    MissingLearningUnits,

    #[error("Sample ID is required for operational sessions")]
    MissingSampleId,

    #[error("A result (VP, FP, VN, FN) is required for operational sessions")]
    MissingResult,

    #[error("No queued entry with id {0}")]
    UnknownQueueItem(String),
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum FluxError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

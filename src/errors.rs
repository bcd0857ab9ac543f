//! Error types for the chainsight answer pipeline.
//!
//! Recoverable conditions (parse failures, backend degradation, empty
//! retrieval) are handled with explicit `Result` values at the site that
//! owns the recovery; only genuinely unexpected provider and storage
//! failures propagate through this taxonomy.

use thiserror::Error;

/// Main error type for retrieval and generation operations
#[derive(Error, Debug)]
pub enum RagError {
    /// Embedding or generation backend unreachable or rejected the request
    #[error("Provider error: {0}")]
    Provider(String),

    /// Vector backend query malformed or unreachable, keyword fallback
    /// included
    #[error("Storage error: {0}")]
    Storage(String),

    /// Decomposition response was not a usable JSON array
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Per-call timeout expired
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unexpected internal failures (task join errors and the like)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;

//! Storage error types.

/// Errors from the backing key-value store.
///
/// A store failure is fatal to the calling operation only; callers propagate
/// it and the next poll cycle retries naturally.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// File I/O error from a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value failed to serialize or deserialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

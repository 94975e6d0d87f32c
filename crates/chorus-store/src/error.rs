//! Error type for persistence collaborators.

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from persistence collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API returned a non-2xx status.
    #[error("store error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, best effort.
        message: String,
    },

    /// The requested record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Record family.
        entity: &'static str,
        /// Requested identity.
        id: String,
    },
}

impl StoreError {
    /// Whether a retry could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Json(_) | Self::NotFound { .. } => false,
        }
    }
}

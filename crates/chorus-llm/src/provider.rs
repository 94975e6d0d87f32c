//! Generation collaborator contracts.
//!
//! Both traits are consumed behind `Arc<dyn …>` so tests can substitute
//! scripted fakes. Failure signaling is uniform: any transport error,
//! non-2xx status, or body that does not match the expected envelope is a
//! [`ProviderError`]. Callers decide locally whether to recover — the
//! planner falls back to a direct response, pipeline actions skip, the
//! conversation paths degrade to a canned assistant message.

use async_trait::async_trait;
use serde_json::Value;

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors from generation collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The gateway returned a non-2xx status.
    #[error("gateway error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, best effort.
        message: String,
    },

    /// The gateway answered 2xx but the body did not match the contract.
    #[error("malformed gateway reply: {message}")]
    Malformed {
        /// What was missing or wrong.
        message: String,
    },
}

impl ProviderError {
    /// Whether a retry could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| {
                        s == reqwest::StatusCode::TOO_MANY_REQUESTS || s.is_server_error()
                    })
            }
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Json(_) | Self::Malformed { .. } => false,
        }
    }

    /// Error category string for log fields.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http(_) => "network",
            Self::Json(_) | Self::Malformed { .. } => "parse",
            Self::Api { .. } => "api",
        }
    }
}

/// One text-generation request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerateRequest {
    /// The full prompt.
    pub prompt: String,
    /// Whether the gateway may pull open-domain context into the answer.
    pub open_domain: bool,
    /// Uploaded-file references the gateway should read.
    pub file_refs: Vec<String>,
}

impl GenerateRequest {
    /// A closed-domain request with no file references.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Allow open-domain context.
    #[must_use]
    pub fn open_domain(mut self) -> Self {
        self.open_domain = true;
        self
    }

    /// Attach file references.
    #[must_use]
    pub fn with_files(mut self, file_refs: Vec<String>) -> Self {
        self.file_refs = file_refs;
        self
    }
}

/// Text-generation collaborator.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate free text for the request.
    async fn generate(&self, request: GenerateRequest) -> ProviderResult<String>;

    /// Generate a JSON object constrained by `schema`.
    ///
    /// The reply is returned unvalidated; callers check the shape they need
    /// and treat mismatches exactly like transport errors.
    async fn generate_structured(
        &self,
        request: GenerateRequest,
        schema: Value,
    ) -> ProviderResult<Value>;
}

/// Image-generation collaborator.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate an image and return its URL.
    async fn generate_image(&self, prompt: &str) -> ProviderResult<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

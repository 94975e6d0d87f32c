//! Runtime error type.
//!
//! Most failure handling in this crate is local — the planner falls back,
//! actions are skipped, sync ticks are swallowed — so [`RuntimeError`]
//! mostly travels short distances between an external call and the handler
//! that decides how to degrade.

use chorus_core::table::TableError;
use chorus_llm::ProviderError;
use chorus_store::StoreError;

/// Result type alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised inside the orchestration engine.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A generation collaborator failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A persistence collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An uploaded file could not be parsed as tabular data.
    #[error(transparent)]
    Table(#[from] TableError),

    /// A structured reply did not match the expected shape.
    #[error("malformed structured reply: {0}")]
    Malformed(String),
}

impl RuntimeError {
    /// Error category string for log fields.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Provider(e) => e.category(),
            Self::Store(_) => "store",
            Self::Table(_) | Self::Malformed(_) => "parse",
        }
    }
}

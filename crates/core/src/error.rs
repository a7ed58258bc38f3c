//! Error types for the Folio domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] aggregates them.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all Folio operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Generation errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Profile errors ---
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of the retrieval or generation stage of one assistant turn.
///
/// Both variants are recovered locally by the next strategy in line and are
/// never shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The embedding or generative capability failed to load or respond.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The model responded but produced no usable text.
    #[error("Model returned no usable text")]
    EmptyGeneration,
}

impl From<ProviderError> for GenerationError {
    fn from(err: ProviderError) -> Self {
        Self::ModelUnavailable(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Failed to read profile at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse profile: {0}")]
    Parse(String),

    #[error("Profile field `{field}` is required but empty")]
    MissingField { field: String },
}

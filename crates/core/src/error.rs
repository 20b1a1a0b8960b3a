//! Error types for the Docent domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Only the model-call boundary produces hard failures: retrieval problems,
//! malformed tool arguments and unknown tools are all recovered as ordinary
//! tool output and never show up here.

use thiserror::Error;

/// The top-level error type for all Docent operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Session errors ---
    #[error("A request is already in progress for this session")]
    Busy,

    #[error("Tool loop did not converge after {turns} turns")]
    NotConverged { turns: u32 },

    // --- Registry errors ---
    #[error("Duplicate tool identifier: {0}")]
    DuplicateTool(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures at the model-call boundary.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

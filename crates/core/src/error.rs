//! Error types for the dfbridge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Malformed caller state is never an error here: the fulfillment
//! layer normalises it to defaults. Only the completion backend fails.

use thiserror::Error;

/// Failures of a single completion call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Classify a transport-level failure without pulling an HTTP client into core.
    pub fn transport(message: impl Into<String>, timed_out: bool) -> Self {
        if timed_out {
            Self::Timeout(message.into())
        } else {
            Self::Network(message.into())
        }
    }
}

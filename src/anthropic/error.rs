use thiserror::Error;

/// Failures of a Messages API call.
///
/// Only [`RateLimited`](AnthropicError::RateLimited) is retried by the
/// generator; everything else turns the attempt into a `failed` outcome.
#[derive(Debug, Error)]
pub enum AnthropicError {
    /// HTTP 429. `retry_after_ms` comes from the `retry-after` header (1s if absent).
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Any other non-2xx status, with the response body as the message.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Connection, timeout or body decoding failure.
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl AnthropicError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnthropicError::RateLimited { .. })
    }
}

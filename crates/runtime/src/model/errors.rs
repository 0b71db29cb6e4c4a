use std::time::Duration;
use thiserror::Error;

/// Errors from LLM provider calls.
///
/// All of these are fatal for the agent run that hit them; retrying is the
/// caller's decision.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A network error occurred during the API call.
    #[error("network: {0}")]
    Network(String),

    /// The LLM provider returned an error response.
    #[error("provider api ({status}): {body}")]
    Api { status: u16, body: String },

    /// The call did not complete in time.
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// The provider response could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// The backend could not be constructed.
    #[error("backend configuration: {0}")]
    Config(String),
}

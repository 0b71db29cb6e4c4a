use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// None of these abort an agent run; the executor turns each one into an
/// error-flagged tool result the model can react to.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("no such tool: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("timeout after {0}ms")]
    Timeout(u64),
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("tool panicked: {0}")]
    Panicked(String),
}

impl From<crate::services::ServiceError> for ToolError {
    fn from(err: crate::services::ServiceError) -> Self {
        Self::Execution(err.to_string())
    }
}

//! Runs tool calls and renders their outcome for the model.

use crate::model::{ToolCall, ToolResult};
use crate::tools::{ToolError, ToolHost};
use futures::FutureExt;
use futures::future::join_all;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{info, warn};

/// Bounds applied to every tool call.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionLimits {
    pub timeout: Duration,
    /// Maximum characters of output handed back to the model.
    pub max_output: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_output: 20_000,
        }
    }
}

/// Execute one call, never failing.
///
/// Handler errors, timeouts and panics all come back as a result with
/// `is_error` set.
pub async fn execute_one<H: ToolHost>(
    host: &H,
    call: &ToolCall,
    limits: &ExecutionLimits,
) -> ToolResult {
    let guarded = AssertUnwindSafe(host.execute(call)).catch_unwind();
    let outcome = match tokio::time::timeout(limits.timeout, guarded).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(panic)) => Err(ToolError::Panicked(panic_message(panic.as_ref()))),
        Err(_) => Err(ToolError::Timeout(limits.timeout.as_millis() as u64)),
    };

    match outcome {
        Ok(value) => {
            info!(tool = %call.name, id = %call.id, "tool call succeeded");
            ToolResult::success(&call.id, truncate(render(value), limits.max_output))
        }
        Err(err) => {
            warn!(tool = %call.name, id = %call.id, error = %err, "tool call failed");
            ToolResult::error(&call.id, format!("Error from {}: {err}", call.name))
        }
    }
}

/// Execute a batch of calls concurrently.
///
/// Exactly one result is returned per call, in request order.
pub async fn execute_batch<H: ToolHost>(
    host: &H,
    calls: &[ToolCall],
    limits: &ExecutionLimits,
) -> Vec<ToolResult> {
    join_all(calls.iter().map(|call| execute_one(host, call, limits))).await
}

fn render(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Cut `text` to `max` characters on a char boundary, noting the cut.
pub fn truncate(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text,
        Some((idx, _)) => {
            let total = text.chars().count();
            format!(
                "{}\n\n[output truncated: showing {max} of {total} characters]",
                &text[..idx]
            )
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

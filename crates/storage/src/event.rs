//! Event types for the run journal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for one agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Who authored a journaled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// The kind of event that occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// A run started for the given request.
    RunStart { request: String },
    /// Text exchanged with the model.
    Message { role: Role, content: String },
    /// The model asked for a tool.
    ToolCall {
        call_id: String,
        name: String,
        input: serde_json::Value,
    },
    /// A tool produced its (possibly error-flagged) output.
    ToolResult {
        call_id: String,
        name: String,
        output: String,
        is_error: bool,
    },
    /// The run finished.
    RunEnd {
        iterations: u32,
        limit_reached: bool,
    },
}

impl EventKind {
    /// Stable short name, also used for filtering.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::RunStart { .. } => "run_start",
            EventKind::Message { .. } => "message",
            EventKind::ToolCall { .. } => "tool_call",
            EventKind::ToolResult { .. } => "tool_result",
            EventKind::RunEnd { .. } => "run_end",
        }
    }
}

/// An event in the run journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub run_id: RunId,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

impl Event {
    pub fn new(run_id: RunId, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn message(run_id: RunId, role: Role, content: impl Into<String>) -> Self {
        Self::new(
            run_id,
            EventKind::Message {
                role,
                content: content.into(),
            },
        )
    }
}

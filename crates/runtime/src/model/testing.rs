//! Scripted backend for tests.

use super::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, StopReason, ToolCall,
    Usage,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// What the backend saw on one call.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

/// Replays queued responses in order and records every request.
///
/// Once the queue is empty it keeps answering with `fallback`, if set.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
    fallback: Option<ModelResponse>,
    calls: Mutex<Vec<Recorded>>,
}

impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = ModelResponse>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            ..Default::default()
        }
    }

    pub fn repeating(reply: ModelResponse) -> Self {
        Self {
            fallback: Some(reply),
            ..Default::default()
        }
    }

    pub fn failing(error: ModelError) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(error)])),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }
}

impl Backend for ScriptedBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        self.calls.lock().unwrap().push(Recorded {
            system: request.system.map(str::to_string),
            messages: request.messages.to_vec(),
            tool_names: request.tools.iter().map(|t| t.name.clone()).collect(),
        });
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ModelError::InvalidResponse("script exhausted".into())),
        }
    }
}

pub fn text_reply(text: &str) -> ModelResponse {
    ModelResponse {
        message: Message::assistant(text),
        stop_reason: StopReason::EndTurn,
        usage: Usage {
            input_tokens: 10,
            output_tokens: 5,
        },
    }
}

/// A tool-use turn with optional leading text.
pub fn tool_reply(text: Option<&str>, calls: &[(&str, &str, Value)]) -> ModelResponse {
    let mut parts: Vec<Part> = text.map(|t| Part::Text(t.to_string())).into_iter().collect();
    parts.extend(calls.iter().map(|(id, name, input)| {
        Part::ToolCall(ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            input: input.clone(),
        })
    }));
    ModelResponse {
        message: Message {
            role: Role::Assistant,
            parts,
        },
        stop_reason: StopReason::ToolUse,
        usage: Usage {
            input_tokens: 10,
            output_tokens: 5,
        },
    }
}

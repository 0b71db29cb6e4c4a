//! The tool-calling agent loop.
//!
//! A run seeds the conversation with the caller's request and then
//! alternates between the model and the tools until the model stops
//! asking for tools or the iteration ceiling is reached. Every tool call
//! of a turn gets exactly one result before the model is called again.

use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, StopReason, ToolCall, ToolResult,
    Usage,
};
use crate::prompts;
use crate::services::{RunContext, Services};
use crate::tools::{ContentTools, ExecutionLimits, ToolHost, ToolRegistry, execute_batch};
use crate::Result;
use chrono::Local;
use std::sync::Mutex;
use std::time::Duration;
use storage::{Event, EventKind, EventStore, RunId};
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Bounds for one agent run.
#[derive(Debug, Clone, Copy)]
pub struct AgentConfig {
    /// Model calls allowed per run. Zero is treated as one.
    pub max_iterations: u32,
    pub model_timeout: Duration,
    pub tools: ExecutionLimits,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            model_timeout: Duration::from_secs(120),
            tools: ExecutionLimits::default(),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: RunId,
    /// Final text, including the limit note when `limit_reached`.
    pub text: String,
    /// Model calls made.
    pub iterations: u32,
    pub limit_reached: bool,
    pub usage: Usage,
}

/// Appended to the response when the ceiling ends a run.
pub fn limit_note(max_iterations: u32) -> String {
    format!(
        "[Note: reached iteration limit of {max_iterations} model calls; \
        the task may be incomplete.]"
    )
}

/// Drives runs against one backend and one set of collaborators.
pub struct Agent<B> {
    backend: B,
    services: Services,
    registry: ToolRegistry,
    config: AgentConfig,
    journal: Option<Mutex<EventStore>>,
}

impl<B: Backend> Agent<B> {
    pub fn new(backend: B, services: Services) -> Self {
        Self {
            backend,
            services,
            registry: ToolRegistry::standard(),
            config: AgentConfig::default(),
            journal: None,
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Record every run into `store`.
    pub fn with_journal(mut self, store: EventStore) -> Self {
        self.journal = Some(Mutex::new(store));
        self
    }

    /// Give back the journal, if one was attached.
    pub fn into_journal(self) -> Option<EventStore> {
        self.journal.and_then(|j| j.into_inner().ok())
    }

    /// Run the agent on `request` and return its final text.
    pub async fn run(&self, request: &str, context: &RunContext) -> Result<String> {
        Ok(self.run_detailed(request, context).await?.text)
    }

    /// Run the agent on `request`, reporting iterations and usage too.
    pub async fn run_detailed(&self, request: &str, context: &RunContext) -> Result<RunOutcome> {
        let run_id = RunId::new();
        let span = info_span!("agent_run", run = %run_id);
        self.drive(run_id, request, context).instrument(span).await
    }

    async fn drive(&self, run_id: RunId, request: &str, context: &RunContext) -> Result<RunOutcome> {
        let tools = ContentTools::new(
            self.registry.clone(),
            self.services.clone(),
            context.clone(),
        );
        let system = prompts::agent_system(Local::now().date_naive());
        let max_iterations = self.config.max_iterations.max(1);

        info!(folder = %context.folder_id, "run started");
        self.record(run_id, EventKind::RunStart {
            request: request.to_string(),
        });
        self.record_message(run_id, storage::Role::User, request);

        let mut messages = vec![Message::user(request)];
        let mut usage = Usage::default();
        let mut iterations = 0;

        loop {
            iterations += 1;
            debug!(iteration = iterations, messages = messages.len(), "calling model");

            let model_request = ModelRequest {
                system: Some(&system),
                messages: &messages,
                tools: tools.specs(),
            };
            let response = call_model(&self.backend, model_request, self.config.model_timeout)
                .await
                .inspect_err(|e| error!(error = %e, iteration = iterations, "model call failed"))?;
            usage += response.usage;

            let text = response.message.text();
            if !text.is_empty() {
                self.record_message(run_id, storage::Role::Assistant, &text);
            }

            let calls = response.message.tool_calls();
            if response.stop_reason != StopReason::ToolUse || calls.is_empty() {
                return Ok(self.finish(run_id, text, iterations, false, usage));
            }

            if iterations >= max_iterations {
                warn!(
                    max_iterations,
                    pending_calls = calls.len(),
                    "iteration limit reached; skipping requested tool calls"
                );
                let note = limit_note(max_iterations);
                let text = if text.is_empty() {
                    note
                } else {
                    format!("{text}\n\n{note}")
                };
                return Ok(self.finish(run_id, text, iterations, true, usage));
            }

            for call in &calls {
                self.record(run_id, EventKind::ToolCall {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.input.clone(),
                });
            }
            messages.push(response.message);

            let results = execute_batch(&tools, &calls, &self.config.tools).await;
            self.record_results(run_id, &calls, &results);
            messages.push(Message::tool_results(results));
        }
    }

    fn finish(
        &self,
        run_id: RunId,
        text: String,
        iterations: u32,
        limit_reached: bool,
        usage: Usage,
    ) -> RunOutcome {
        info!(
            iterations,
            limit_reached,
            tokens = usage.total_tokens(),
            "run finished"
        );
        self.record(run_id, EventKind::RunEnd {
            iterations,
            limit_reached,
        });
        RunOutcome {
            run_id,
            text,
            iterations,
            limit_reached,
            usage,
        }
    }

    fn record_results(&self, run_id: RunId, calls: &[ToolCall], results: &[ToolResult]) {
        for (call, result) in calls.iter().zip(results) {
            self.record(run_id, EventKind::ToolResult {
                call_id: result.tool_call_id.clone(),
                name: call.name.clone(),
                output: result.content.clone(),
                is_error: result.is_error,
            });
        }
    }

    fn record_message(&self, run_id: RunId, role: storage::Role, content: &str) {
        self.append(Event::message(run_id, role, content));
    }

    fn record(&self, run_id: RunId, kind: EventKind) {
        self.append(Event::new(run_id, kind));
    }

    /// Journal failures are logged, never fatal.
    fn append(&self, event: Event) {
        let Some(journal) = &self.journal else {
            return;
        };
        let outcome = match journal.lock() {
            Ok(store) => store.append(&event).map_err(|e| e.to_string()),
            Err(_) => Err("journal lock poisoned".to_string()),
        };
        if let Err(e) = outcome {
            warn!(error = %e, kind = event.kind.name(), "failed to journal event");
        }
    }
}

/// One model call bounded by `timeout`.
pub(crate) async fn call_model<B: Backend>(
    backend: &B,
    request: ModelRequest<'_>,
    timeout: Duration,
) -> std::result::Result<ModelResponse, ModelError> {
    tokio::time::timeout(timeout, backend.call(request))
        .await
        .map_err(|_| ModelError::Timeout(timeout))?
}

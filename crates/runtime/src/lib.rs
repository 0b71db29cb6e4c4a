//! Draftsmith runtime: the content agent and its model plumbing.
//!
//! This crate holds everything between a natural-language request and a
//! filed draft:
//!
//! - **Model layer** ([`model`], [`providers`]): provider-agnostic message
//!   types, the [`Backend`] trait and the Anthropic implementation.
//! - **Tools** ([`tools`]): the fixed catalog the model may call, input
//!   validation, and an executor that turns every failure into an
//!   error-flagged result instead of aborting the run.
//! - **Agent** ([`Agent`]): the bounded tool-calling loop.
//! - **Generation** ([`Generator`]): one-shot article writing with
//!   best-effort parsing of the model's labelled output.
//! - **Services** ([`Services`]): the document, publishing and search
//!   collaborators, passed in explicitly.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{Agent, AnthropicAuth, AnthropicBackend, RunContext, Services};
//!
//! # async fn example(services: Services) -> runtime::Result<()> {
//! let auth = AnthropicAuth::ApiKey("sk-ant-api01-...".into());
//! let backend = AnthropicBackend::builder(auth, runtime::DEFAULT_MODEL).build()?;
//! let agent = Agent::new(backend, services);
//!
//! let text = agent
//!     .run("List all interviews", &RunContext::new("interviews"))
//!     .await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```

mod agent;
mod article;
mod error;
mod generate;
pub mod model;
pub mod parser;
mod prompts;
pub mod providers;
mod services;
pub mod tools;

pub use agent::{Agent, AgentConfig, RunOutcome, limit_note};
pub use article::{ArticleDraft, DraftStatus, first_paragraph, strip_tags, truncate_words};
pub use error::{Error, Result};
pub use generate::{ArticleKind, Generator};
pub use model::{Backend, Message, ModelError, StopReason, ToolCall, ToolResult, ToolSpec, Usage};
pub use parser::{FreeTextParser, ResponseParser, parse_article};
pub use providers::{AnthropicAuth, AnthropicBackend, AnthropicBackendBuilder, DEFAULT_MODEL};
pub use services::{
    ArticleSummary, DocumentStore, DocumentSummary, DraftReceipt, PublishingStore, RunContext,
    SearchResult, ServiceError, Services, WebSearch,
};

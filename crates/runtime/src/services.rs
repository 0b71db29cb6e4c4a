//! Contracts for the external systems the agent talks to.
//!
//! The runtime never reaches for a global client. Everything it needs is
//! bundled into [`Services`] once at startup and passed down explicitly,
//! which is also how tests swap in fakes.

use crate::article::ArticleDraft;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a collaborator.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("http {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("misconfigured: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// A document in a store folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// An article already known to the publishing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Where a freshly created draft can be found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftReceipt {
    pub id: String,
    pub url: String,
}

/// A single web search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: String,
}

/// Source documents (interview transcripts, idea notes).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self, folder_id: &str) -> Result<Vec<DocumentSummary>, ServiceError>;

    async fn get_document_text(&self, id: &str) -> Result<String, ServiceError>;
}

/// The content-management system articles are filed into.
#[async_trait]
pub trait PublishingStore: Send + Sync {
    /// Every known article, flattened across pages.
    async fn list_articles(&self) -> Result<Vec<ArticleSummary>, ServiceError>;

    async fn create_draft(&self, draft: &ArticleDraft) -> Result<DraftReceipt, ServiceError>;
}

/// Web research. Implementations apply their domain exclusion list
/// before returning.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ServiceError>;
}

/// Handles to every collaborator, built once per process.
#[derive(Clone)]
pub struct Services {
    pub documents: Arc<dyn DocumentStore>,
    pub publishing: Arc<dyn PublishingStore>,
    pub search: Arc<dyn WebSearch>,
}

impl Services {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        publishing: Arc<dyn PublishingStore>,
        search: Arc<dyn WebSearch>,
    ) -> Self {
        Self {
            documents,
            publishing,
            search,
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

/// Per-run scope handed to the tools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    /// Folder holding interview documents.
    pub folder_id: String,
    /// Folder holding idea notes, when the run may use them.
    pub ideas_folder_id: Option<String>,
}

impl RunContext {
    pub fn new(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            ideas_folder_id: None,
        }
    }

    pub fn with_ideas_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.ideas_folder_id = Some(folder_id.into());
        self
    }
}

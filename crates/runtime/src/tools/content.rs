//! Tool handlers backed by the document, publishing and search services.

use crate::article::{ArticleDraft, DraftStatus};
use crate::model::{ToolCall, ToolSpec};
use crate::parser::{normalize_tag, unescape_html};
use crate::services::{ArticleSummary, RunContext, Services};
use crate::tools::{ToolError, ToolHost, ToolName, ToolRegistry};
use dedupe::{check_exists, slugify};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value, json};

const DEFAULT_LIST_LIMIT: usize = 20;
const DEFAULT_SEARCH_RESULTS: usize = 5;
const MAX_SEARCH_RESULTS: usize = 10;
const MAX_SIMILAR: usize = 10;

/// The content agent's tools, scoped to one run.
pub struct ContentTools {
    registry: ToolRegistry,
    services: Services,
    context: RunContext,
}

impl ContentTools {
    pub fn new(registry: ToolRegistry, services: Services, context: RunContext) -> Self {
        Self {
            registry,
            services,
            context,
        }
    }

    async fn list_documents(&self, folder_id: &str, limit: Option<usize>) -> Result<Value, ToolError> {
        let mut documents = self.services.documents.list_documents(folder_id).await?;
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        documents.truncate(limit.unwrap_or(DEFAULT_LIST_LIMIT));
        Ok(json!({ "count": documents.len(), "documents": documents }))
    }

    async fn read_document(&self, input: ReadDocumentInput) -> Result<Value, ToolError> {
        let text = self
            .services
            .documents
            .get_document_text(&input.document_id)
            .await?;
        Ok(Value::String(text))
    }

    async fn articles(&self) -> Result<Vec<ArticleSummary>, ToolError> {
        let mut articles = self.services.publishing.list_articles().await?;
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(articles)
    }

    async fn list_articles(&self, input: LimitInput) -> Result<Value, ToolError> {
        let mut articles = self.articles().await?;
        articles.truncate(input.limit.unwrap_or(DEFAULT_LIST_LIMIT));
        Ok(json!({ "count": articles.len(), "articles": articles }))
    }

    async fn check_existing(&self, input: TitleInput) -> Result<Value, ToolError> {
        let articles = self.articles().await?;
        let exact = find_existing(&input.title, &articles);
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        let mut similar = check_exists(&input.title, &titles).similar;
        similar.truncate(MAX_SIMILAR);

        Ok(json!({
            "title": input.title,
            "exists": exact.is_some(),
            "exact_match": exact.map(|a| json!({"title": a.title, "slug": a.slug})),
            "similar": similar,
            "articles_checked": articles.len(),
        }))
    }

    async fn search_web(&self, input: SearchInput) -> Result<Value, ToolError> {
        let max = input
            .max_results
            .unwrap_or(DEFAULT_SEARCH_RESULTS)
            .clamp(1, MAX_SEARCH_RESULTS);
        let results = self.services.search.search(&input.query, max).await?;
        Ok(json!({ "query": input.query, "results": results }))
    }

    async fn create_draft(&self, input: DraftInput) -> Result<Value, ToolError> {
        let articles = self.services.publishing.list_articles().await?;
        if let Some(existing) = find_existing(&input.title, &articles) {
            return Err(ToolError::Execution(format!(
                "an article titled \"{}\" already exists (slug {}); choose a different angle or title",
                existing.title, existing.slug
            )));
        }

        let mut draft = ArticleDraft {
            title: input.title,
            html: unescape_html(&input.html),
            excerpt: input.excerpt.unwrap_or_default(),
            meta_title: input.meta_title.unwrap_or_default(),
            meta_description: input.meta_description.unwrap_or_default(),
            tags: input.tags,
            status: DraftStatus::Draft,
        };
        draft.fill_defaults();

        let receipt = self.services.publishing.create_draft(&draft).await?;
        Ok(json!({
            "id": receipt.id,
            "url": receipt.url,
            "title": draft.title,
            "status": draft.status,
        }))
    }
}

impl ToolHost for ContentTools {
    fn specs(&self) -> &[ToolSpec] {
        self.registry.specs()
    }

    async fn execute(&self, call: &ToolCall) -> Result<Value, ToolError> {
        let name = ToolName::from(call.name.as_str());
        if let ToolName::Unknown(unknown) = &name {
            return Err(ToolError::NotFound(unknown.clone()));
        }
        let fields = self.registry.validate(name.as_str(), &call.input)?;

        match name {
            ToolName::ListInterviews => {
                let input: LimitInput = decode(&name, fields)?;
                self.list_documents(&self.context.folder_id, input.limit).await
            }
            ToolName::ListIdeas => {
                let input: LimitInput = decode(&name, fields)?;
                let folder = self.context.ideas_folder_id.as_deref().ok_or_else(|| {
                    ToolError::Unavailable("no ideas folder is configured for this run".into())
                })?;
                self.list_documents(folder, input.limit).await
            }
            ToolName::ReadDocument => self.read_document(decode(&name, fields)?).await,
            ToolName::ListArticles => self.list_articles(decode(&name, fields)?).await,
            ToolName::CheckExistingArticles => self.check_existing(decode(&name, fields)?).await,
            ToolName::SearchWeb => self.search_web(decode(&name, fields)?).await,
            ToolName::CreateDraft => self.create_draft(decode(&name, fields)?).await,
            ToolName::Unknown(unknown) => Err(ToolError::NotFound(unknown)),
        }
    }
}

/// The existing article that exactly matches `title`, by title or slug.
fn find_existing<'a>(title: &str, articles: &'a [ArticleSummary]) -> Option<&'a ArticleSummary> {
    let slug = slugify(title);
    articles.iter().find(|article| {
        article.slug == slug || check_exists(title, &[article.title.as_str()]).exists()
    })
}

fn decode<T: DeserializeOwned>(name: &ToolName, fields: &Map<String, Value>) -> Result<T, ToolError> {
    T::deserialize(Value::Object(fields.clone()))
        .map_err(|e| ToolError::InvalidInput(format!("{name}: {e}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool inputs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LimitInput {
    #[serde(default, deserialize_with = "lenient_usize")]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ReadDocumentInput {
    #[serde(deserialize_with = "lenient_string")]
    document_id: String,
}

#[derive(Debug, Deserialize)]
struct TitleInput {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SearchInput {
    query: String,
    #[serde(default, deserialize_with = "lenient_usize")]
    max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct DraftInput {
    title: String,
    html: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    meta_title: Option<String>,
    #[serde(default)]
    meta_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    tags: Vec<String>,
}

/// Accept `5`, `"5"` or `null`.
fn lenient_usize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| de::Error::custom(format!("expected a positive integer, got {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a positive integer, got \"{s}\""))),
        other => Err(de::Error::custom(format!("expected a positive integer, got {other}"))),
    }
}

/// Accept a string or a bare number (models sometimes unquote ids).
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected a string, got {other}"))),
    }
}

/// Accept `["a", "b"]` or `"a, b"`, normalizing each tag.
fn lenient_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw: Vec<String> = match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        other => return Err(de::Error::custom(format!("expected tags, got {other}"))),
    };
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.iter().filter_map(|t| normalize_tag(t)) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

//! One-shot article generation without tools.

use crate::agent::call_model;
use crate::article::ArticleDraft;
use crate::model::{Backend, Message, ModelRequest};
use crate::parser::{FreeTextParser, ResponseParser};
use crate::prompts;
use crate::services::{DraftReceipt, SearchResult, Services};
use crate::{Error, Result};
use dedupe::check_exists;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

const RESEARCH_RESULTS: usize = 5;

/// What an article is written from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleKind {
    Interview { document_id: String },
    Idea { document_id: String },
    Topic { topic: String },
}

impl fmt::Display for ArticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interview { document_id } => write!(f, "interview {document_id}"),
            Self::Idea { document_id } => write!(f, "idea {document_id}"),
            Self::Topic { topic } => write!(f, "topic \"{topic}\""),
        }
    }
}

/// Writes articles with a single model call and parses the result.
pub struct Generator<B, P = FreeTextParser> {
    backend: B,
    services: Services,
    parser: P,
    model_timeout: Duration,
}

impl<B: Backend> Generator<B> {
    pub fn new(backend: B, services: Services) -> Self {
        Self {
            backend,
            services,
            parser: FreeTextParser,
            model_timeout: Duration::from_secs(120),
        }
    }
}

impl<B: Backend, P: ResponseParser> Generator<B, P> {
    pub fn with_parser<Q: ResponseParser>(self, parser: Q) -> Generator<B, Q> {
        Generator {
            backend: self.backend,
            services: self.services,
            parser,
            model_timeout: self.model_timeout,
        }
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    /// Produce a draft for `kind`, with metadata filled in.
    pub async fn generate(&self, kind: &ArticleKind) -> Result<ArticleDraft> {
        let request = self.request_for(kind).await?;
        let system = prompts::generator_system();
        let messages = [Message::user(request)];

        let response = call_model(
            &self.backend,
            ModelRequest {
                system: Some(&system),
                messages: &messages,
                tools: &[],
            },
            self.model_timeout,
        )
        .await?;

        let mut draft = self.parser.parse(&response.message.text());
        draft.fill_defaults();
        info!(%kind, title = %draft.title, tags = draft.tags.len(), "article generated");
        Ok(draft)
    }

    /// File `draft` with the publishing store unless its title already exists.
    pub async fn publish(&self, draft: &ArticleDraft) -> Result<DraftReceipt> {
        let articles = self.services.publishing.list_articles().await?;
        let known: Vec<&str> = articles
            .iter()
            .flat_map(|a| [a.title.as_str(), a.slug.as_str()])
            .collect();
        if let Some(existing) = check_exists(&draft.title, &known).exact_match {
            return Err(Error::Duplicate {
                title: draft.title.clone(),
                existing,
            });
        }

        let receipt = self.services.publishing.create_draft(draft).await?;
        info!(id = %receipt.id, url = %receipt.url, "draft created");
        Ok(receipt)
    }

    async fn request_for(&self, kind: &ArticleKind) -> Result<String> {
        match kind {
            ArticleKind::Interview { document_id } => {
                let text = self.services.documents.get_document_text(document_id).await?;
                Ok(prompts::interview_request(&text))
            }
            ArticleKind::Idea { document_id } => {
                let text = self.services.documents.get_document_text(document_id).await?;
                Ok(prompts::idea_request(&text))
            }
            ArticleKind::Topic { topic } => {
                let research = match self.services.search.search(topic, RESEARCH_RESULTS).await {
                    Ok(results) => render_research(&results),
                    Err(e) => {
                        warn!(error = %e, "research failed; writing without it");
                        String::new()
                    }
                };
                Ok(prompts::topic_request(topic, &research))
            }
        }
    }
}

fn render_research(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {} ({})\n{}\n{}", i + 1, r.title, r.source, r.snippet, r.url))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelError;
    use crate::model::testing::{ScriptedBackend, text_reply};
    use crate::services::testing;

    const LABELLED: &str = "Title: Maria Lopez: Clay, Fire and Patience\n\
        Tags: Ceramics, small business\n\n\
        ```html\n<h2>The studio</h2>\n<p>Maria\\'s kiln runs hot.</p>\n```";

    #[tokio::test]
    async fn interview_draft_is_parsed_and_enriched() {
        let (services, _, search) = testing::services();
        let generator = Generator::new(ScriptedBackend::new([text_reply(LABELLED)]), services);

        let draft = generator
            .generate(&ArticleKind::Interview {
                document_id: "doc-maria".into(),
            })
            .await
            .unwrap();

        assert_eq!(draft.title, "Maria Lopez: Clay, Fire and Patience");
        assert_eq!(draft.html, "<h2>The studio</h2>\n<p>Maria's kiln runs hot.</p>");
        assert_eq!(draft.tags, vec!["ceramics", "small business"]);
        assert_eq!(draft.meta_title, draft.title);
        assert_eq!(draft.excerpt, "Maria's kiln runs hot.");
        assert_eq!(draft.meta_description, "Maria's kiln runs hot.");

        let calls = generator.backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].tool_names.is_empty());
        assert!(calls[0].messages[0].text().contains("pottery studio"));
        assert!(search.queries().is_empty());
    }

    #[tokio::test]
    async fn topic_gathers_research_first() {
        let (services, _, search) = testing::services();
        let generator = Generator::new(ScriptedBackend::new([text_reply(LABELLED)]), services);

        generator
            .generate(&ArticleKind::Topic {
                topic: "peony season".into(),
            })
            .await
            .unwrap();

        assert_eq!(search.queries(), vec![("peony season".to_string(), 5)]);
        let prompt = generator.backend.calls()[0].messages[0].text();
        assert!(prompt.contains("<research>"));
        assert!(prompt.contains("peony season result 0"));
    }

    #[tokio::test]
    async fn unstructured_reply_still_yields_a_draft() {
        let (services, _, _) = testing::services();
        let generator = Generator::new(
            ScriptedBackend::new([text_reply("Sorry, I can't write that.")]),
            services,
        );
        let draft = generator
            .generate(&ArticleKind::Idea {
                document_id: "idea-pricing".into(),
            })
            .await
            .unwrap();
        assert!(draft.title.is_empty());
        assert!(draft.html.is_empty());
        assert!(draft.tags.is_empty());
    }

    #[tokio::test]
    async fn missing_document_and_model_errors_propagate() {
        let (services, _, _) = testing::services();
        let generator = Generator::new(ScriptedBackend::new([]), services.clone());
        let err = generator
            .generate(&ArticleKind::Interview {
                document_id: "nope".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Service(_)));

        let generator = Generator::new(ScriptedBackend::failing(ModelError::Network("down".into())), services);
        let err = generator
            .generate(&ArticleKind::Topic { topic: "x".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Model(ModelError::Network(_))));
    }

    #[tokio::test]
    async fn publish_refuses_existing_titles() {
        let (services, publishing, _) = testing::services();
        let generator = Generator::new(ScriptedBackend::default(), services);

        let duplicate = ArticleDraft {
            title: "Pricing Wedding Flowers".into(),
            ..Default::default()
        };
        let err = generator.publish(&duplicate).await.unwrap_err();
        assert!(matches!(err, Error::Duplicate { .. }));

        let fresh = ArticleDraft {
            title: "Kiln Safety Basics".into(),
            ..Default::default()
        };
        let receipt = generator.publish(&fresh).await.unwrap();
        assert_eq!(receipt.id, "draft-1");
        assert_eq!(publishing.created().len(), 1);
    }
}

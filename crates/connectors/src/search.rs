//! Brave web search.

use crate::http::{json_body, transport};
use async_trait::async_trait;
use reqwest::Client;
use runtime::{SearchResult, ServiceError, WebSearch, strip_tags};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_BRAVE_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";

/// Most results Brave returns per request.
const MAX_COUNT: usize = 20;

/// Web search through the Brave Search API.
#[derive(Clone)]
pub struct BraveSearch {
    client: Client,
    endpoint: String,
    api_key: String,
    exclude_domains: Vec<String>,
}

impl std::fmt::Debug for BraveSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraveSearch")
            .field("endpoint", &self.endpoint)
            .field("exclude_domains", &self.exclude_domains)
            .finish_non_exhaustive()
    }
}

impl BraveSearch {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: DEFAULT_BRAVE_ENDPOINT.to_string(),
            api_key: api_key.into(),
            exclude_domains: Vec::new(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Drop results from these hosts and their sub-domains.
    pub fn with_excluded_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().trim_start_matches("www.").to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        self
    }

    fn is_excluded(&self, host: &str) -> bool {
        self.exclude_domains.iter().any(|domain| {
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

#[derive(Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<WebResults>,
}

#[derive(Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<WebResult>,
}

#[derive(Deserialize)]
struct WebResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

#[async_trait]
impl WebSearch for BraveSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::Config("no search api key configured".into()));
        }
        // Ask for extra so exclusions do not starve the result list.
        let count = (max_results + self.exclude_domains.len()).clamp(1, MAX_COUNT);

        let response = self
            .client
            .get(&self.endpoint)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", count.to_string().as_str())])
            .send()
            .await
            .map_err(transport)?;
        let body: BraveResponse = json_body(response).await?;

        let raw = body.web.map(|w| w.results).unwrap_or_default();
        let total = raw.len();
        let results: Vec<SearchResult> = raw
            .into_iter()
            .filter_map(|r| {
                let host = Url::parse(&r.url)
                    .ok()?
                    .host_str()?
                    .trim_start_matches("www.")
                    .to_lowercase();
                if self.is_excluded(&host) {
                    return None;
                }
                Some(SearchResult {
                    title: strip_tags(&r.title),
                    url: r.url,
                    snippet: strip_tags(&r.description),
                    source: host,
                })
            })
            .take(max_results)
            .collect();

        debug!(query, total, kept = results.len(), "web search finished");
        Ok(results)
    }
}
